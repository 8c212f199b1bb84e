use glam::DVec3;
use parking_lot::Mutex;

use crate::utils::allocator::BodyId;

/// Destination of the forces and torques produced by pair evaluations.
///
/// A pair hands over one force: body 1 receives it and body 2 its negation,
/// so Newton's third law holds by construction. Torques differ per body.
pub trait ForceSink {
    fn apply_pair(
        &mut self,
        body1: BodyId,
        body2: BodyId,
        force: DVec3,
        torque1: DVec3,
        torque2: DVec3,
    );
}

/// Dense per-body force and torque accumulators indexed by arena slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceBuffer {
    forces: Vec<DVec3>,
    torques: Vec<DVec3>,
}

impl ForceBuffer {
    pub fn new(slots: usize) -> Self {
        Self {
            forces: vec![DVec3::ZERO; slots],
            torques: vec![DVec3::ZERO; slots],
        }
    }

    fn ensure(&mut self, index: usize) {
        if index >= self.forces.len() {
            self.forces.resize(index + 1, DVec3::ZERO);
            self.torques.resize(index + 1, DVec3::ZERO);
        }
    }

    pub fn add_force(&mut self, body: BodyId, force: DVec3) {
        self.ensure(body.index());
        self.forces[body.index()] += force;
    }

    pub fn add_torque(&mut self, body: BodyId, torque: DVec3) {
        self.ensure(body.index());
        self.torques[body.index()] += torque;
    }

    pub fn force(&self, body: BodyId) -> DVec3 {
        self.forces.get(body.index()).copied().unwrap_or(DVec3::ZERO)
    }

    pub fn torque(&self, body: BodyId) -> DVec3 {
        self.torques.get(body.index()).copied().unwrap_or(DVec3::ZERO)
    }

    /// Zeroes every accumulator and resizes to `slots`.
    pub fn reset(&mut self, slots: usize) {
        self.forces.clear();
        self.torques.clear();
        self.forces.resize(slots, DVec3::ZERO);
        self.torques.resize(slots, DVec3::ZERO);
    }

    /// Adds another buffer into this one, slot by slot.
    pub fn merge(&mut self, other: &ForceBuffer) {
        if other.forces.len() > self.forces.len() {
            self.forces.resize(other.forces.len(), DVec3::ZERO);
            self.torques.resize(other.torques.len(), DVec3::ZERO);
        }
        for (mine, theirs) in self.forces.iter_mut().zip(&other.forces) {
            *mine += *theirs;
        }
        for (mine, theirs) in self.torques.iter_mut().zip(&other.torques) {
            *mine += *theirs;
        }
    }

    pub fn net_force(&self) -> DVec3 {
        self.forces.iter().copied().sum()
    }
}

impl ForceSink for ForceBuffer {
    fn apply_pair(
        &mut self,
        body1: BodyId,
        body2: BodyId,
        force: DVec3,
        torque1: DVec3,
        torque2: DVec3,
    ) {
        self.add_force(body1, force);
        self.add_torque(body1, torque1);
        self.add_force(body2, -force);
        self.add_torque(body2, torque2);
    }
}

/// Shared accumulators with one lock per body, for workers that write
/// straight into the step's totals.
///
/// Only one body lock is held at a time. Slots must be sized before the pass.
#[derive(Debug, Default)]
pub struct LockedForceBuffer {
    slots: Vec<Mutex<(DVec3, DVec3)>>,
}

impl LockedForceBuffer {
    pub fn new(slots: usize) -> Self {
        Self {
            slots: (0..slots)
                .map(|_| Mutex::new((DVec3::ZERO, DVec3::ZERO)))
                .collect(),
        }
    }

    fn add(&self, body: BodyId, force: DVec3, torque: DVec3) {
        match self.slots.get(body.index()) {
            Some(slot) => {
                let mut guard = slot.lock();
                guard.0 += force;
                guard.1 += torque;
            }
            None => log::error!("force accumulator missing for body {:?}", body),
        }
    }

    pub fn into_buffer(self) -> ForceBuffer {
        let (forces, torques): (Vec<DVec3>, Vec<DVec3>) =
            self.slots.into_iter().map(|slot| slot.into_inner()).unzip();
        ForceBuffer { forces, torques }
    }
}

impl ForceSink for &LockedForceBuffer {
    fn apply_pair(
        &mut self,
        body1: BodyId,
        body2: BodyId,
        force: DVec3,
        torque1: DVec3,
        torque2: DVec3,
    ) {
        self.add(body1, force, torque1);
        self.add(body2, -force, torque2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_forces_cancel() {
        let mut buffer = ForceBuffer::new(2);
        let (a, b) = (BodyId::from_index(0), BodyId::from_index(1));
        buffer.apply_pair(a, b, DVec3::new(1.0, -2.0, 3.0), DVec3::X, DVec3::Y);
        assert_eq!(buffer.force(a), -buffer.force(b));
        assert_eq!(buffer.net_force(), DVec3::ZERO);
        assert_eq!(buffer.torque(b), DVec3::Y);
    }

    #[test]
    fn buffers_grow_and_merge() {
        let mut left = ForceBuffer::new(1);
        let mut right = ForceBuffer::default();
        let far = BodyId::from_index(4);
        right.add_force(far, DVec3::X);
        left.add_force(BodyId::from_index(0), DVec3::Y);
        left.merge(&right);
        assert_eq!(left.force(far), DVec3::X);
        assert_eq!(left.force(BodyId::from_index(0)), DVec3::Y);
        assert_eq!(left.force(BodyId::from_index(9)), DVec3::ZERO);
    }

    #[test]
    fn locked_buffer_matches_the_plain_one() {
        let (a, b) = (BodyId::from_index(0), BodyId::from_index(2));
        let locked = LockedForceBuffer::new(3);
        let mut sink = &locked;
        sink.apply_pair(a, b, DVec3::Z, DVec3::X, DVec3::ZERO);

        let mut plain = ForceBuffer::new(3);
        plain.apply_pair(a, b, DVec3::Z, DVec3::X, DVec3::ZERO);
        assert_eq!(locked.into_buffer(), plain);
    }
}
