//! Cross-crate scenario tests matching spec §8's concrete end-to-end
//! scenarios. Per-crate property tests already cover scenarios 1
//! (RFC 9001 vector, in `crypto`), 3 (record split, in `tls::record`),
//! 4 (send backpressure, in `datapath::socket_ctx`) and 6 (cert chain
//! round-trip, in `tls::cert`) in isolation; this crate adds the two
//! scenarios that need more than one crate wired together and keeps an
//! explicit, literal rendition of the HashTable scenario the teacher's
//! own generic tests don't spell out verbatim.

#[cfg(test)]
mod hashtable_insert_lookup_scenario {
    use hashtable::HashTable;

    /// Spec §8 scenario 2, verbatim multiset: {A:sig=1, B:sig=2, C:sig=1}
    /// into a freshly created table (already size 128 per
    /// `HashTable::new`).
    #[test]
    fn literal_scenario_multiset() {
        let mut table: HashTable<&'static str> = HashTable::new();
        assert_eq!(table.table_size(), 128);

        let a = table.insert("A", 1);
        let _b = table.insert("B", 2);
        let c = table.insert("C", 1);

        let mut walk = table.lookup(1);
        let mut seen = Vec::new();
        while let Some(id) = table.lookup_next(&mut walk) {
            seen.push(*table.get(id).unwrap());
        }
        assert_eq!(seen, vec!["C", "A"], "insertion-run order: most recently inserted same-signature entry first");

        let mut walk = table.lookup(2);
        let mut seen = Vec::new();
        while let Some(id) = table.lookup_next(&mut walk) {
            seen.push(*table.get(id).unwrap());
        }
        assert_eq!(seen, vec!["B"]);

        let mut walk = table.lookup(3);
        assert!(table.lookup_next(&mut walk).is_none());

        table.remove(a);
        let mut walk = table.lookup(1);
        let mut seen = Vec::new();
        while let Some(id) = table.lookup_next(&mut walk) {
            seen.push(*table.get(id).unwrap());
        }
        assert_eq!(seen, vec!["C"]);

        table.remove(c);
        assert_eq!(table.len(), 1);
    }
}

#[cfg(test)]
mod unreachable_plumbing_scenario {
    use datapath::{DatapathCallbacks, OwnedRecvBlock};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingCallbacks {
        unreachable_count: AtomicUsize,
        last_remote: std::sync::Mutex<Option<SocketAddr>>,
    }

    impl DatapathCallbacks for CountingCallbacks {
        fn receive(&self, _block: OwnedRecvBlock) {}
        fn unreachable(&self, remote: SocketAddr) {
            self.unreachable_count.fetch_add(1, Ordering::SeqCst);
            *self.last_remote.lock().unwrap() = Some(remote);
        }
    }

    /// Spec §8 scenario 5: a connected UDP socket whose remote refuses the
    /// datagram (no listener on that loopback port) gets an ICMP
    /// Port-Unreachable back from the kernel; once `check_unreachable`
    /// observes `SO_ERROR == ECONNREFUSED` it calls `Unreachable` exactly
    /// once with the configured remote.
    #[tokio::test]
    async fn econnrefused_triggers_unreachable_exactly_once() {
        // Bind a throwaway socket purely to reserve a port nothing is
        // listening on, then drop it so the remote port is refused.
        let probe = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let closed_port = probe.local_addr().unwrap().port();
        drop(probe);
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), closed_port);

        let callbacks = Arc::new(CountingCallbacks {
            unreachable_count: AtomicUsize::new(0),
            last_remote: std::sync::Mutex::new(None),
        });
        let one = std::num::NonZeroUsize::new(1).unwrap();
        let dp = datapath::Datapath::new(one, one, callbacks.clone()).unwrap();
        let socket = dp.create_socket(None, Some(remote)).unwrap();
        let ctx = &socket.contexts[0];

        ctx.send(datapath::SendData::new(vec![b"are you there".to_vec()], remote, 0, dp.max_batch_size()).unwrap())
            .unwrap();

        // Give the kernel time to deliver the ICMP error back to the
        // connected socket before polling SO_ERROR.
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            ctx.check_unreachable();
            if callbacks.unreachable_count.load(Ordering::SeqCst) > 0 {
                break;
            }
            if std::time::Instant::now() > deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(callbacks.unreachable_count.load(Ordering::SeqCst), 1);
        assert_eq!(*callbacks.last_remote.lock().unwrap(), Some(remote));
    }
}
