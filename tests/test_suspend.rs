// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Suspend/wake/cancel coordination, and the ioctl suspension bookkeeping
// for connect/accept.

mod common;

use common::*;
use libuds::{
    Control, ControlKind, Grant, IoFlags, Reply, RequestId, SockErr, SockType, SuspendKind,
};

#[test]
fn cancel_interrupts_a_suspended_read() {
    let mut drv = new_driver();
    let (_a, b) = open_pair(&mut drv, SockType::Stream);

    assert_eq!(
        drv.read(b, EP_B, Grant(1), 8, IoFlags::empty(), RequestId(42)),
        Reply::Suspend
    );
    assert_eq!(drv.table().suspension(b), Some(SuspendKind::Read));

    // The interrupted reply answers the original request.
    assert_eq!(drv.cancel(b, EP_B, RequestId(42)), Reply::Fail(SockErr::Interrupted));
    assert_eq!(drv.table().suspension(b), None);
}

#[test]
fn cancel_requires_a_matching_request() {
    let mut drv = new_driver();
    let (_a, b) = open_pair(&mut drv, SockType::Stream);

    drv.read(b, EP_B, Grant(1), 8, IoFlags::empty(), RequestId(42));

    // Wrong id, wrong endpoint, wrong minor: all owe no reply.
    assert_eq!(drv.cancel(b, EP_B, RequestId(43)), Reply::Suspend);
    assert_eq!(drv.cancel(b, EP_C, RequestId(42)), Reply::Suspend);
    assert_eq!(drv.cancel(_a, EP_B, RequestId(42)), Reply::Suspend);
    // The suspension survives unmatched cancels.
    assert_eq!(drv.table().suspension(b), Some(SuspendKind::Read));
}

#[test]
fn cancel_of_a_closed_or_bogus_minor_owes_no_reply() {
    let mut drv = new_driver();
    assert_eq!(drv.cancel(7, EP_A, RequestId(1)), Reply::Suspend);
    assert_eq!(drv.cancel(usize::MAX, EP_A, RequestId(1)), Reply::Suspend);
}

#[test]
fn ioctl_guards_and_owner_refresh() {
    let mut drv = new_driver();
    let m = drv.open(EP_A).unwrap();
    assert_eq!(drv.table().owner(m), EP_A);

    let r = drv.ioctl(m, 7, EP_A, Grant(1), IoFlags::empty(), EP_C, RequestId(1));
    assert_eq!(r, Reply::Done(0));
    // Every control touch re-stamps the owning user endpoint.
    assert_eq!(drv.table().owner(m), EP_C);

    let r = drv.ioctl(99, 7, EP_A, Grant(1), IoFlags::empty(), EP_A, RequestId(1));
    assert_eq!(r, Reply::Fail(SockErr::NotOpen));
}

#[test]
fn ioctl_failure_passes_through() {
    let mut drv = new_driver();
    let m = drv.open(EP_A).unwrap();
    drv.control_mut().script.push_back(Control::Fail(SockErr::NotConnected));

    let r = drv.ioctl(m, 7, EP_A, Grant(1), IoFlags::empty(), EP_A, RequestId(1));
    assert_eq!(r, Reply::Fail(SockErr::NotConnected));
}

#[test]
fn suspended_connect_completes_through_unsuspend() {
    let mut drv = new_driver();
    let client = drv.open(EP_A).unwrap();
    drv.table_mut().set_sock_type(client, SockType::Stream);

    drv.control_mut().script.push_back(Control::Suspend(ControlKind::Connect));
    let r = drv.ioctl(client, 7, EP_A, Grant(1), IoFlags::empty(), EP_A, RequestId(5));
    assert_eq!(r, Reply::Suspend);
    assert_eq!(drv.table().suspension(client), Some(SuspendKind::Connect));

    // The pairing completed elsewhere; success is delivered as a zero reply.
    drv.unsuspend(client);
    assert_eq!(drv.table().suspension(client), None);
    assert_eq!(drv.transport().replies, vec![(EP_A, RequestId(5), Ok(0))]);
}

#[test]
fn suspended_connect_delivers_a_parked_error() {
    let mut drv = new_driver();
    let client = drv.open(EP_A).unwrap();
    drv.table_mut().set_sock_type(client, SockType::Stream);

    drv.control_mut().script.push_back(Control::Suspend(ControlKind::Connect));
    drv.ioctl(client, 7, EP_A, Grant(1), IoFlags::empty(), EP_A, RequestId(5));

    drv.table_mut().set_pending_err(client, SockErr::ConnReset);
    drv.unsuspend(client);
    assert_eq!(
        drv.transport().replies,
        vec![(EP_A, RequestId(5), Err(SockErr::ConnReset))]
    );
    // The parked error was consumed by the delivery.
    assert_eq!(recv(&mut drv, client, EP_A, Grant(2), 4), Reply::Fail(SockErr::NotConnected));
}

#[test]
fn nonblocking_connect_is_in_progress() {
    let mut drv = new_driver();
    let client = drv.open(EP_A).unwrap();
    drv.table_mut().set_sock_type(client, SockType::Stream);

    drv.control_mut().script.push_back(Control::Suspend(ControlKind::Connect));
    let r = drv.ioctl(client, 7, EP_A, Grant(1), IoFlags::NONBLOCK, EP_A, RequestId(5));
    assert_eq!(r, Reply::Fail(SockErr::InProgress));
    // The caller's interest is severed, the connection continues alone.
    assert_eq!(drv.table().suspension(client), None);
}

#[test]
fn nonblocking_accept_would_block() {
    let mut drv = new_driver();
    let server = drv.open(EP_A).unwrap();
    drv.table_mut().set_sock_type(server, SockType::Stream);

    drv.control_mut().script.push_back(Control::Suspend(ControlKind::Accept));
    let r = drv.ioctl(server, 7, EP_A, Grant(1), IoFlags::NONBLOCK, EP_A, RequestId(5));
    assert_eq!(r, Reply::Fail(SockErr::WouldBlock));
    assert_eq!(drv.table().suspension(server), None);
}

#[test]
fn cancelled_accept_detaches_the_pending_child() {
    let mut drv = new_driver();
    let listener = drv.open(EP_A).unwrap();
    let accepting = drv.open(EP_A).unwrap();
    {
        let table = drv.table_mut();
        table.set_sock_type(listener, SockType::Stream);
        table.set_sock_type(accepting, SockType::Stream);
        table.listen(listener, 4);
        // A partial accept leaves the accepting socket attached as child.
        table.set_child(listener, accepting);
    }

    drv.control_mut().script.push_back(Control::Suspend(ControlKind::Accept));
    drv.ioctl(accepting, 7, EP_A, Grant(1), IoFlags::empty(), EP_A, RequestId(8));
    assert_eq!(drv.table().suspension(accepting), Some(SuspendKind::Accept));

    assert_eq!(drv.cancel(accepting, EP_A, RequestId(8)), Reply::Fail(SockErr::Interrupted));
    assert_eq!(drv.table().suspension(accepting), None);
    assert_eq!(drv.table().child(listener), None);
}

#[test]
fn cancelled_connect_leaves_the_connection_queued() {
    let mut drv = new_driver();
    let server = drv.open(EP_A).unwrap();
    let client = drv.open(EP_B).unwrap();
    {
        let table = drv.table_mut();
        table.set_sock_type(server, SockType::Stream);
        table.set_sock_type(client, SockType::Stream);
        table.listen(server, 4);
        assert!(table.enqueue_connecting(server, client));
    }

    drv.control_mut().script.push_back(Control::Suspend(ControlKind::Connect));
    drv.ioctl(client, 7, EP_B, Grant(1), IoFlags::empty(), EP_B, RequestId(9));

    assert_eq!(drv.cancel(client, EP_B, RequestId(9)), Reply::Fail(SockErr::Interrupted));
    // The half-made connection stays queued and may complete later.
    assert_eq!(drv.table().peer(client), Some(server));
    assert!(drv.table().backlog_pending(server));
}

#[test]
fn only_one_operation_suspends_per_socket() {
    let mut drv = new_driver();
    let (a, b) = open_pair(&mut drv, SockType::Stream);

    drv.read(b, EP_B, Grant(1), 8, IoFlags::empty(), RequestId(1));
    assert_eq!(drv.table().suspension(b), Some(SuspendKind::Read));

    // The wake path replies to the one recorded requester exactly once.
    send(&mut drv, a, EP_A, Grant(2), b"z");
    assert_eq!(drv.transport().replies.len(), 1);
    assert_eq!(drv.table().suspension(b), None);
}

#[test]
fn wake_leaves_the_suspension_when_still_blocked() {
    let mut drv = new_driver();
    let (a, b) = open_pair(&mut drv, SockType::SeqPacket);

    // Fill the boundary, then queue a second writer behind it.
    send(&mut drv, a, EP_A, Grant(1), b"one");
    drv.transport_mut().set_grant(EP_A, Grant(2), b"two");
    assert_eq!(drv.write(a, EP_A, Grant(2), 3, IoFlags::empty(), RequestId(7)), Reply::Suspend);

    // Reading nothing (zero bytes) changes no state and wakes nobody.
    assert_eq!(drv.read(b, EP_B, Grant(3), 0, IoFlags::empty(), RequestId(8)), Reply::Done(0));
    assert_eq!(drv.table().suspension(a), Some(SuspendKind::Write));
    assert!(drv.transport().replies.is_empty());
}
