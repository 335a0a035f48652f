//! Integration tests for the distributed interface exchange.
//!
//! These tests verify:
//! - pack -> send -> recv -> unpack delivers the peer's lhs data in matching order
//! - Buffer sizes and the fixed exchange tag
//! - No cross-talk with other tags on the same rank pair
//! - Separate receive buffers per neighbour rank
//! - Size mismatch and timeout surface as communication failures

use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use fr_rs::backend::HostBackend;
use fr_rs::comm::{CommError, LocalWorld, Tag, Transport};
use fr_rs::elements::{ElementMap, ElementType, FaceShape, FluxPointElements, InterfaceSide, ScalarState};
use fr_rs::interfaces::{EXCHANGE_TAG, InterfaceSet};
use fr_rs::mesh::QuadMesh;
use fr_rs::{Config, InterfaceError, Kernel, Rank};

const NVARS: usize = 4;

fn euler() -> Config {
    Config::default().with_constant("gamma", 1.4)
}

/// Quad store of `neles` elements with value `100 * rank + 10 * e + k` at every point.
fn tagged_quads(be: &mut HostBackend, rank: usize, neles: usize, npts: usize) -> ElementMap {
    let quads = FluxPointElements::new(be, ElementType::Quad, NVARS, neles, &[(FaceShape::Line, npts); 4]).unwrap();
    quads
        .fill(be, ScalarState::Primary, |e, p, k| {
            (100 * rank + 10 * e.get()) as f64 + k as f64 + 0.01 * p as f64
        })
        .unwrap();
    ElementMap::new().with(quads)
}

/// Pack, send and post the receive for every set.
fn post(be: &mut HostBackend, sets: &[InterfaceSet]) -> Result<(), InterfaceError> {
    for set in sets {
        let [pack, send, recv, _] = set.exchange_kernels(&*be)?.expect("distributed set");
        be.run(&[pack, send, recv])?;
    }
    Ok(())
}

/// Complete the receive of every set.
fn complete(be: &mut HostBackend, sets: &[InterfaceSet]) -> Result<(), InterfaceError> {
    for set in sets {
        let [.., unpack] = set.exchange_kernels(&*be)?.expect("distributed set");
        be.run(&[unpack])?;
    }
    Ok(())
}

/// One full exchange round.
fn exchange(be: &mut HostBackend, sets: &[InterfaceSet]) -> Result<(), InterfaceError> {
    post(be, sets)?;
    complete(be, sets)
}

#[test]
fn test_exchange_on_partitioned_mesh() {
    let mesh = QuadMesh::uniform_rectangle(0.0, 3.0, 0.0, 2.0, 3, 2);
    let nranks = 3;
    let npts = 2;
    let ranks = mesh.partition_columns(nranks);
    let world = LocalWorld::new(nranks).with_timeout(Duration::from_secs(10));

    // every rank fills its storage from physical coordinates, so matching
    // points must carry identical values on both ranks
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = Rank::iter(nranks)
            .map(|me| {
                let mesh = &mesh;
                let ranks = &ranks;
                let world = &world;
                s.spawn(move || {
                    let part = mesh.split(ranks, me).unwrap();
                    let mut be = HostBackend::with_transport(world.transport(me).unwrap());
                    let quads = mesh.elements(&mut be, &part.elements, npts, NVARS, false).unwrap();
                    quads
                        .fill(&mut be, ScalarState::Primary, |e, p, k| {
                            let (x, y) = mesh.fpt_coord(part.elements[e.get()], p, npts);
                            x + 7.0 * y + 1000.0 * k as f64
                        })
                        .unwrap();
                    let elemap = ElementMap::new().with(quads);

                    let sets: Vec<_> = part
                        .remote
                        .iter()
                        .map(|(&peer, sides)| {
                            InterfaceSet::distributed(&mut be, sides, peer, &elemap, &euler()).unwrap()
                        })
                        .collect();
                    exchange(&mut be, &sets).unwrap();

                    sets.iter()
                        .map(|set| {
                            let base = set.distributed_base().unwrap();
                            let sent = be.gather_mpi_view(base.lhs_view()).unwrap();
                            let got = be.recv_buffer(base.rhs_matrix()).unwrap().clone();
                            (sent, got)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // middle rank talks to both neighbours, the outer ranks to one
    assert_eq!(results[0].len(), 1);
    assert_eq!(results[1].len(), 2);
    assert_eq!(results[2].len(), 1);

    for pairs in &results {
        for (sent, got) in pairs {
            assert_eq!(sent.nrows(), 2 * npts);
            assert_eq!((got.nrows(), got.ncols()), (sent.nrows(), sent.ncols()));
            for i in 0..sent.nrows() {
                for k in 0..NVARS {
                    assert_relative_eq!(sent[(i, k)], got[(i, k)], epsilon = 1e-12);
                }
            }
        }
    }
}

#[test]
fn test_five_interfaces_to_rank_two() {
    let world = LocalWorld::new(3);
    let mut be0 = HostBackend::with_transport(world.transport(Rank::new(0)).unwrap());
    let mut be2 = HostBackend::with_transport(world.transport(Rank::new(2)).unwrap());
    let map0 = tagged_quads(&mut be0, 0, 5, 3);
    let map2 = tagged_quads(&mut be2, 2, 5, 3);

    let lhs0: Vec<_> = (0..5).map(|e| InterfaceSide::new(ElementType::Quad, e, 1, 0)).collect();
    let lhs2: Vec<_> = (0..5).map(|e| InterfaceSide::new(ElementType::Quad, e, 3, 1)).collect();
    let set0 = InterfaceSet::distributed(&mut be0, &lhs0, Rank::new(2), &map0, &euler()).unwrap();
    let set2 = InterfaceSet::distributed(&mut be2, &lhs2, Rank::new(0), &map2, &euler()).unwrap();

    let [pack, send, recv, unpack] = set0.exchange_kernels(&be0).unwrap().unwrap();
    assert!(matches!(send, Kernel::SendPack { tag, .. } if tag == EXCHANGE_TAG));
    assert!(matches!(recv, Kernel::RecvPack { tag, .. } if tag == EXCHANGE_TAG));
    assert_eq!(EXCHANGE_TAG.get(), 2314);

    be0.run(&[pack]).unwrap();
    let packed = be0.send_buffer(set0.distributed_base().unwrap().lhs_view()).unwrap();
    assert_eq!(packed.nrows() * packed.ncols(), 15 * NVARS);

    be0.run(&[send, recv]).unwrap();
    exchange(&mut be2, std::slice::from_ref(&set2)).unwrap();
    be0.run(&[unpack]).unwrap();

    let got0 = be0.recv_buffer(set0.distributed_base().unwrap().rhs_matrix()).unwrap();
    let sent2 = be2.gather_mpi_view(set2.distributed_base().unwrap().lhs_view()).unwrap();
    assert_eq!(got0.nrows(), 15);
    for i in 0..15 {
        for k in 0..NVARS {
            assert_eq!(got0[(i, k)].to_bits(), sent2[(i, k)].to_bits());
        }
    }
    // rank 2 values, element 0 first, rotated face order
    assert_relative_eq!(got0[(0, 1)], 201.0 + 0.01 * 11.0);
}

#[test]
fn test_other_tags_do_not_cross_talk() {
    let world = LocalWorld::new(2);
    let mut be0 = HostBackend::with_transport(world.transport(Rank::new(0)).unwrap());
    let mut be1 = HostBackend::with_transport(world.transport(Rank::new(1)).unwrap());
    let map0 = tagged_quads(&mut be0, 0, 1, 2);
    let map1 = tagged_quads(&mut be1, 1, 1, 2);

    let other = Tag::new(7);
    assert_ne!(other, EXCHANGE_TAG);
    let side1 = world.transport(Rank::new(1)).unwrap();
    side1.isend(Rank::new(0), other, vec![-1.0; 2 * NVARS]).unwrap();

    let set0 = InterfaceSet::distributed(&mut be0, &[InterfaceSide::new(ElementType::Quad, 0, 1, 0)], Rank::new(1), &map0, &euler()).unwrap();
    let set1 = InterfaceSet::distributed(&mut be1, &[InterfaceSide::new(ElementType::Quad, 0, 3, 1)], Rank::new(0), &map1, &euler()).unwrap();
    let set1 = std::slice::from_ref(&set1);
    post(&mut be1, set1).unwrap();
    exchange(&mut be0, std::slice::from_ref(&set0)).unwrap();
    complete(&mut be1, set1).unwrap();

    let got = be0.recv_buffer(set0.distributed_base().unwrap().rhs_matrix()).unwrap();
    assert!((0..got.nrows()).all(|i| got[(i, 0)] >= 100.0));

    // the stray message is still waiting under its own tag
    let side0 = world.transport(Rank::new(0)).unwrap();
    let stray = side0.irecv(Rank::new(1), other, 2 * NVARS).unwrap().wait().unwrap();
    assert_eq!(stray, vec![-1.0; 2 * NVARS]);
}

#[test]
fn test_neighbours_get_separate_receive_buffers() {
    let world = LocalWorld::new(3);
    let mut be: Vec<_> = Rank::iter(3)
        .map(|r| HostBackend::with_transport(world.transport(r).unwrap()))
        .collect();
    let maps: Vec<_> = be.iter_mut().enumerate().map(|(r, b)| tagged_quads(b, r, 2, 2)).collect();

    let side = |e| [InterfaceSide::new(ElementType::Quad, e, 0, 0)];
    let to1 = InterfaceSet::distributed(&mut be[0], &side(0), Rank::new(1), &maps[0], &euler()).unwrap();
    let to2 = InterfaceSet::distributed(&mut be[0], &side(1), Rank::new(2), &maps[0], &euler()).unwrap();
    let from1 = InterfaceSet::distributed(&mut be[1], &side(0), Rank::new(0), &maps[1], &euler()).unwrap();
    let from2 = InterfaceSet::distributed(&mut be[2], &side(0), Rank::new(0), &maps[2], &euler()).unwrap();

    let rhs1 = to1.distributed_base().unwrap().rhs_matrix();
    let rhs2 = to2.distributed_base().unwrap().rhs_matrix();
    assert_ne!(rhs1, rhs2);

    post(&mut be[1], std::slice::from_ref(&from1)).unwrap();
    post(&mut be[2], std::slice::from_ref(&from2)).unwrap();
    exchange(&mut be[0], &[to1, to2]).unwrap();
    complete(&mut be[1], std::slice::from_ref(&from1)).unwrap();
    complete(&mut be[2], std::slice::from_ref(&from2)).unwrap();

    assert_eq!(be[0].recv_buffer(rhs1).unwrap()[(0, 0)], 100.0);
    assert_eq!(be[0].recv_buffer(rhs2).unwrap()[(0, 0)], 200.0);
}

#[test]
fn test_size_mismatch_is_communication_failure() {
    let world = LocalWorld::new(2);
    let mut be0 = HostBackend::with_transport(world.transport(Rank::new(0)).unwrap());
    let map0 = tagged_quads(&mut be0, 0, 1, 2);
    let set0 = InterfaceSet::distributed(&mut be0, &[InterfaceSide::new(ElementType::Quad, 0, 1, 0)], Rank::new(1), &map0, &euler()).unwrap();

    // the peer sends three points where two are expected
    let peer = world.transport(Rank::new(1)).unwrap();
    peer.isend(Rank::new(0), EXCHANGE_TAG, vec![0.0; 3 * NVARS]).unwrap();

    let err = exchange(&mut be0, std::slice::from_ref(&set0)).unwrap_err();
    assert!(matches!(
        err,
        InterfaceError::CommunicationFailure(CommError::SizeMismatch { expected: 8, actual: 12, .. })
    ));
}

#[test]
fn test_stalled_exchange_times_out() {
    let world = LocalWorld::new(2).with_timeout(Duration::from_millis(20));
    let mut be0 = HostBackend::with_transport(world.transport(Rank::new(0)).unwrap());
    let mut be1 = HostBackend::with_transport(world.transport(Rank::new(1)).unwrap());
    let map0 = tagged_quads(&mut be0, 0, 1, 2);
    let map1 = tagged_quads(&mut be1, 1, 1, 2);

    let cfg = euler();
    let set0 = InterfaceSet::distributed(&mut be0, &[InterfaceSide::new(ElementType::Quad, 0, 1, 0)], Rank::new(1), &map0, &cfg).unwrap();
    // rank 1 builds its set but never runs the exchange
    let _set1 = InterfaceSet::distributed(&mut be1, &[InterfaceSide::new(ElementType::Quad, 0, 3, 1)], Rank::new(0), &map1, &cfg).unwrap();

    let err = exchange(&mut be0, std::slice::from_ref(&set0)).unwrap_err();
    assert!(matches!(
        err,
        InterfaceError::CommunicationFailure(CommError::Timeout { .. })
    ));
}
