use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use bitstream::{BitBuffer, BitReader, BufferPool, PoolConfig};
use proptest::collection::vec;
use proptest::prelude::*;
use replica::{
    read_dirty_group, write_dirty_group, ClientId, DirtyValue, NetworkVariable, ReadPermission,
    ReplicaError, UpdateTraits, VarSettings, WritePermission,
};

struct Player {
    position: DirtyValue<[f32; 3]>,
    inventory: DirtyValue<BTreeMap<String, u32>>,
    tags: DirtyValue<HashSet<u16>>,
}

impl Player {
    fn new(settings: &VarSettings) -> Self {
        Self {
            position: DirtyValue::with_settings([0.0; 3], settings.clone()),
            inventory: DirtyValue::with_settings(BTreeMap::new(), settings.clone()),
            tags: DirtyValue::with_settings(HashSet::new(), settings.clone()),
        }
    }

    fn vars(&mut self) -> [&mut dyn NetworkVariable; 3] {
        [&mut self.position, &mut self.inventory, &mut self.tags]
    }
}

#[test]
fn server_state_converges_on_client() {
    let pool = BufferPool::new(PoolConfig::for_testing());
    let settings = VarSettings::default();
    let mut server = Player::new(&settings);
    let mut client = Player::new(&settings);
    let start = Instant::now();

    for tick in 0u32..30 {
        let now = start + Duration::from_millis(u64::from(tick) * 16);
        server
            .position
            .modify(ClientId::SERVER, |p| p[0] += 0.5)
            .unwrap();
        if tick % 4 == 0 {
            server
                .inventory
                .modify(ClientId::SERVER, |inv| {
                    *inv.entry(format!("item{}", tick % 12)).or_insert(0) += 1;
                })
                .unwrap();
        }
        if tick % 7 == 0 {
            server
                .tags
                .modify(ClientId::SERVER, |tags| {
                    tags.insert(tick as u16);
                })
                .unwrap();
        }

        let bytes = {
            let mut buffer = pool.acquire();
            write_dirty_group(&mut server.vars(), ClientId::new(1), now, &mut buffer).unwrap();
            buffer.to_owned_bytes()
        };
        let mut reader = BitReader::new(&bytes);
        read_dirty_group(&mut client.vars(), ClientId::SERVER, false, &mut reader).unwrap();

        assert_eq!(client.position.value(), server.position.value());
        assert_eq!(client.inventory.value(), server.inventory.value());
        assert_eq!(client.tags.value(), server.tags.value());
    }
    assert_eq!(pool.stats().outstanding, 0);
}

#[test]
fn throttled_value_waits_for_interval() {
    let traits = UpdateTraits::unlimited().with_min_interval(Duration::from_millis(100));
    let mut value = DirtyValue::with_settings(0u32, VarSettings::default().with_traits(traits));
    let start = Instant::now();

    value.set(ClientId::SERVER, 1).unwrap();
    let mut buffer = BitBuffer::new();
    value.sync(&mut buffer, start).unwrap();

    value.set(ClientId::SERVER, 2).unwrap();
    let mut vars: [&mut dyn NetworkVariable; 1] = [&mut value];
    let mut buffer = BitBuffer::new();
    let sent =
        write_dirty_group(&mut vars, ClientId::new(1), start + Duration::from_millis(50), &mut buffer)
            .unwrap();
    assert_eq!(sent, 0);
    let sent = write_dirty_group(
        &mut vars,
        ClientId::new(1),
        start + Duration::from_millis(100),
        &mut buffer,
    )
    .unwrap();
    assert_eq!(sent, 1);
}

#[test]
fn owner_only_values_flow_both_ways() {
    let owner = ClientId::new(8);
    let settings = VarSettings::default()
        .with_write(WritePermission::OwnerOnly)
        .with_read(ReadPermission::Everyone);

    let mut on_client = DirtyValue::with_settings(String::from("idle"), settings.clone());
    on_client.set_owner(owner);
    let mut on_server = DirtyValue::with_settings(String::from("idle"), settings);
    on_server.set_owner(owner);

    assert!(matches!(
        on_server.set(ClientId::SERVER, "hacked".into()),
        Err(ReplicaError::PermissionDenied { .. })
    ));

    on_client.set(owner, "running".into()).unwrap();
    let mut buffer = BitBuffer::new();
    on_client.sync(&mut buffer, Instant::now()).unwrap();
    on_server
        .read_delta(&mut BitReader::new(buffer.as_bytes()), true)
        .unwrap();
    assert_eq!(on_server.value(), "running");
    assert!(on_server.is_dirty());
}

#[test]
fn batch_error_keeps_earlier_values() {
    let mut server = Player::new(&VarSettings::default());
    server
        .position
        .set(ClientId::SERVER, [1.0, 2.0, 3.0])
        .unwrap();
    server
        .inventory
        .modify(ClientId::SERVER, |inv| {
            inv.insert("sword".into(), 1);
        })
        .unwrap();
    let mut buffer = BitBuffer::new();
    write_dirty_group(&mut server.vars(), ClientId::new(1), Instant::now(), &mut buffer).unwrap();
    let bytes = buffer.into_bytes();

    let mut client = Player::new(&VarSettings::default());
    let truncated = &bytes[..bytes.len() - 2];
    assert!(read_dirty_group(&mut client.vars(), ClientId::SERVER, false, &mut BitReader::new(truncated)).is_err());
    assert_eq!(*client.position.value(), [1.0, 2.0, 3.0]);
    assert!(client.inventory.value().is_empty());
}

proptest! {
    #[test]
    fn client_tracks_server_across_edits(
        rounds in vec(vec((0usize..24, any::<u16>()), 0..6), 1..12),
        lengths in vec(0usize..24, 1..12),
    ) {
        let mut server = DirtyValue::new(vec![0u16; 16]);
        let mut client = DirtyValue::new(vec![0u16; 16]);
        let start = Instant::now();

        for (round, edits) in rounds.iter().enumerate() {
            let target_len = lengths[round % lengths.len()];
            server
                .modify(ClientId::SERVER, |list| {
                    list.resize(target_len, 7);
                    for &(index, value) in edits {
                        if index < list.len() {
                            list[index] = value;
                        }
                    }
                })
                .unwrap();

            let now = start + Duration::from_millis(round as u64);
            if server.should_send(now) {
                let mut buffer = BitBuffer::new();
                server.sync(&mut buffer, now).unwrap();
                client
                    .read_delta(&mut BitReader::new(buffer.as_bytes()), false)
                    .unwrap();
            }
            prop_assert!(!server.is_dirty());
            prop_assert_eq!(client.value(), server.value());
        }
    }
}
