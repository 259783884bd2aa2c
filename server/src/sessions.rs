//! Session registry: maps transport endpoints to assigned roles.
//!
//! Sessions are ephemeral. The registry enforces role exclusivity (at most
//! one pursuer and one chaser across all endpoints) and is owned and mutated
//! exclusively by the server's driving loop.

use log::info;
use shared::{Contender, Role};
use std::collections::HashMap;
use std::net::SocketAddr;

/// A join was refused because another endpoint holds the competitive role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTaken(pub Contender);

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SocketAddr, Role>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `role` to `addr`, idempotently overwriting any previous
    /// assignment the same endpoint held. Pursuer and chaser are exclusive
    /// across endpoints; observer joins always succeed.
    pub fn join(&mut self, addr: SocketAddr, role: Role) -> Result<(), RoleTaken> {
        if let Some(who) = role.contender() {
            if let Some(holder) = self.holder(who) {
                if holder != addr {
                    return Err(RoleTaken(who));
                }
            }
        }
        if self.sessions.insert(addr, role) != Some(role) {
            info!("{addr} joined as {role:?}");
        }
        Ok(())
    }

    pub fn role_of(&self, addr: SocketAddr) -> Option<Role> {
        self.sessions.get(&addr).copied()
    }

    /// The endpoint currently holding a competitive role, if any.
    pub fn holder(&self, who: Contender) -> Option<SocketAddr> {
        let role = who.role();
        self.sessions
            .iter()
            .find(|(_, held)| **held == role)
            .map(|(addr, _)| *addr)
    }

    pub fn both_contenders_present(&self) -> bool {
        self.holder(Contender::Pursuer).is_some() && self.holder(Contender::Chaser).is_some()
    }

    /// Drops the session, returning the role it held.
    pub fn remove(&mut self, addr: SocketAddr) -> Option<Role> {
        let role = self.sessions.remove(&addr);
        if let Some(role) = role {
            info!("{addr} left (was {role:?})");
        }
        role
    }

    /// All known endpoints, for broadcasting.
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops every session. Used when the server resets for a new match.
    pub fn clear(&mut self) {
        if !self.sessions.is_empty() {
            info!("dropping all {} sessions", self.sessions.len());
        }
        self.sessions.clear();
    }
}
