// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Shared test scaffolding: an in-memory transport that backs grants with
// byte arenas and records deferred replies, plus a scripted control plane.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use libuds::{
    Control, ControlPlane, Driver, Endpoint, Grant, IoFlags, Minor, Reply, RequestId, SelectOps,
    SockErr, SockType, SocketTable, Transport,
};

pub const EP_A: Endpoint = Endpoint(100);
pub const EP_B: Endpoint = Endpoint(101);
pub const EP_C: Endpoint = Endpoint(102);

/// Transport double: grants are plain byte vectors keyed by
/// `(endpoint, grant)`, replies and select notifications are recorded.
pub struct MockTransport {
    pub grants: HashMap<(i32, i32), Vec<u8>>,
    pub replies: Vec<(Endpoint, RequestId, Result<usize, SockErr>)>,
    pub select_notes: Vec<(Endpoint, Minor, SelectOps)>,
    pub terminated: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            grants: HashMap::new(),
            replies: Vec::new(),
            select_notes: Vec::new(),
            terminated: false,
        }
    }

    /// Seed a grant with client-side bytes (the source of a write).
    pub fn set_grant(&mut self, endpt: Endpoint, grant: Grant, data: &[u8]) {
        self.grants.insert((endpt.0, grant.0), data.to_vec());
    }

    /// Bytes currently in a grant (the destination of a read).
    pub fn grant_data(&self, endpt: Endpoint, grant: Grant) -> &[u8] {
        self.grants
            .get(&(endpt.0, grant.0))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Transport for MockTransport {
    fn copy_to(
        &mut self,
        endpt: Endpoint,
        grant: Grant,
        offset: usize,
        data: &[u8],
    ) -> Result<(), SockErr> {
        assert_ne!(endpt, Endpoint::NONE, "copy on a pretend call");
        let buf = self.grants.entry((endpt.0, grant.0)).or_default();
        if buf.len() < offset + data.len() {
            buf.resize(offset + data.len(), 0);
        }
        buf[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn copy_from(
        &mut self,
        endpt: Endpoint,
        grant: Grant,
        offset: usize,
        data: &mut [u8],
    ) -> Result<(), SockErr> {
        assert_ne!(endpt, Endpoint::NONE, "copy on a pretend call");
        let buf = self
            .grants
            .get(&(endpt.0, grant.0))
            .ok_or(SockErr::CopyFault(libc::EFAULT))?;
        if buf.len() < offset + data.len() {
            return Err(SockErr::CopyFault(libc::EFAULT));
        }
        data.copy_from_slice(&buf[offset..offset + data.len()]);
        Ok(())
    }

    fn reply_task(&mut self, endpt: Endpoint, id: RequestId, result: Result<usize, SockErr>) {
        self.replies.push((endpt, id, result));
    }

    fn reply_select(&mut self, endpt: Endpoint, minor: Minor, ops: SelectOps) {
        self.select_notes.push((endpt, minor, ops));
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}

/// Control plane double: replays a queue of prepared outcomes (default Ok)
/// and records released descriptors.
pub struct ScriptControl {
    pub script: VecDeque<Control>,
    pub released: Vec<(Minor, Vec<i32>)>,
}

impl ScriptControl {
    pub fn new() -> Self {
        Self { script: VecDeque::new(), released: Vec::new() }
    }
}

impl<T: Transport> ControlPlane<T> for ScriptControl {
    fn do_ioctl(
        &mut self,
        _table: &mut SocketTable,
        _transport: &mut T,
        _minor: Minor,
        _request: u32,
        _endpt: Endpoint,
        _grant: Grant,
    ) -> Control {
        self.script.pop_front().unwrap_or(Control::Ok)
    }

    fn release_fds(&mut self, minor: Minor, fds: &[i32]) {
        self.released.push((minor, fds.to_vec()));
    }
}

pub type TestDriver = Driver<MockTransport, ScriptControl>;

pub fn new_driver() -> TestDriver {
    Driver::new(MockTransport::new(), ScriptControl::new())
}

/// Open two sockets of the same type and link them as a connected pair.
pub fn open_pair(drv: &mut TestDriver, ty: SockType) -> (Minor, Minor) {
    let a = drv.open(EP_A).expect("open a");
    let b = drv.open(EP_B).expect("open b");
    let table = drv.table_mut();
    table.set_sock_type(a, ty);
    table.set_sock_type(b, ty);
    table.connect_pair(a, b);
    (a, b)
}

/// Blocking write of `data` from `endpt` through a fresh grant.
pub fn send(
    drv: &mut TestDriver,
    minor: Minor,
    endpt: Endpoint,
    grant: Grant,
    data: &[u8],
) -> Reply {
    drv.transport_mut().set_grant(endpt, grant, data);
    drv.write(minor, endpt, grant, data.len(), IoFlags::empty(), RequestId(1))
}

/// Blocking read of up to `n` bytes into a fresh grant; the bytes land in
/// the mock grant arena.
pub fn recv(drv: &mut TestDriver, minor: Minor, endpt: Endpoint, grant: Grant, n: usize) -> Reply {
    drv.read(minor, endpt, grant, n, IoFlags::empty(), RequestId(2))
}
