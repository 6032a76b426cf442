//! Proof-of-authority proposer scheduling
//!
//! Pure function of (signer, eligible proposers, parent number, parent
//! timestamp). Slots are `block_interval` seconds apart starting right
//! after the parent. Each slot is owned by one active proposer chosen by
//! a hash of (parent number, slot time), so every node derives the same
//! rotation without coordination.
//!
//! Producing a block after skipped slots deactivates the proposers that
//! owned them and earns a smaller score increment; an inactive signer that
//! produces a block is re-activated.

use super::authority::Proposer;
use super::error::SchedulerError;
use crate::config::ProtocolConfig;
use shared_types::{keccak256_concat, Address};

/// Scheduler for one signer on top of one parent block.
#[derive(Clone, Debug)]
pub struct Scheduler {
    proposer: Proposer,
    /// Active proposers plus the signer itself, in registry order
    actives: Vec<Proposer>,
    parent_number: u32,
    parent_time: u64,
    interval: u64,
    max_proposers: u64,
}

impl Scheduler {
    /// Fails if `signer` is not among `proposers`.
    pub fn new(
        signer: Address,
        proposers: &[Proposer],
        parent_number: u32,
        parent_time: u64,
        config: &ProtocolConfig,
    ) -> Result<Self, SchedulerError> {
        let mut listed: Option<Proposer> = None;
        let mut actives = Vec::with_capacity(proposers.len());

        for p in proposers {
            if p.address == signer {
                if listed.is_none() {
                    listed = Some(*p);
                    actives.push(*p);
                }
            } else if p.active {
                actives.push(*p);
            }
        }

        let proposer = listed.ok_or(SchedulerError::UnauthorizedSigner)?;

        Ok(Self {
            proposer,
            actives,
            parent_number,
            parent_time,
            interval: config.block_interval,
            max_proposers: config.max_block_proposers,
        })
    }

    /// Earliest slot at or after `now` (and after the parent) owned by the
    /// signer. Used by block producers.
    pub fn schedule(&self, now: u64) -> u64 {
        let t = self.interval;
        let mut new_block_time = self.parent_time + t;
        if now > new_block_time {
            // keep it on the grid and >= now
            new_block_time += (now - new_block_time).div_ceil(t) * t;
        }

        while self.whose_turn(new_block_time).address != self.proposer.address {
            new_block_time += t;
        }
        new_block_time
    }

    /// Whether the signer owns the slot at `new_block_time`.
    pub fn is_the_time(&self, new_block_time: u64) -> bool {
        if self.parent_time >= new_block_time {
            return false;
        }
        if (new_block_time - self.parent_time) % self.interval != 0 {
            return false;
        }
        self.whose_turn(new_block_time).address == self.proposer.address
    }

    /// Activity updates and score increment for producing at
    /// `new_block_time`.
    ///
    /// The score delta is `actives - deactivated`, so it is at least 1.
    pub fn updates(&self, new_block_time: u64) -> (Vec<Proposer>, u64) {
        let mut updates: Vec<Proposer> = Vec::new();

        let mut slot = new_block_time.saturating_sub(self.interval);
        let mut walked = 0;
        while walked < self.max_proposers && slot > self.parent_time {
            let owner = self.whose_turn(slot);
            if owner.address != self.proposer.address
                && !updates.iter().any(|p| p.address == owner.address)
            {
                updates.push(Proposer {
                    address: owner.address,
                    active: false,
                });
            }
            slot = slot.saturating_sub(self.interval);
            walked += 1;
        }

        let score = (self.actives.len() - updates.len()) as u64;

        if !self.proposer.active {
            updates.push(Proposer {
                address: self.proposer.address,
                active: true,
            });
        }

        (updates, score)
    }

    fn whose_turn(&self, t: u64) -> &Proposer {
        let index = dprp(self.parent_number, t) % self.actives.len() as u64;
        &self.actives[index as usize]
    }
}

/// Deterministic pseudo-random value for a slot.
fn dprp(block_number: u32, time: u64) -> u64 {
    let hash = keccak256_concat(&[&block_number.to_be_bytes()[..], &time.to_be_bytes()[..]]);
    let mut b8 = [0u8; 8];
    b8.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(b8)
}
