//! Administrator roles and the global circuit breaker.
//!
//! Two administrators share control: the primary ("CEO") and the secondary
//! ("CFO"). Either may halt the system; only the primary may restart it.
//! Administrator changes and pause/resume are the only calls accepted
//! while the system is paused.

use kyama_types::{Address, KyamaError, Result, Role};

/// Read-side capability every operation module checks before acting.
pub trait CircuitBreaker {
    /// Whether mutating calls are currently accepted.
    fn is_operational(&self) -> bool;

    fn is_primary(&self, caller: Address) -> bool;

    fn is_secondary(&self, caller: Address) -> bool;

    /// Fails with [`KyamaError::NotOperational`] while paused.
    fn ensure_operational(&self) -> Result<()> {
        if self.is_operational() {
            Ok(())
        } else {
            Err(KyamaError::NotOperational)
        }
    }

    fn ensure_primary(&self, caller: Address) -> Result<()> {
        if self.is_primary(caller) {
            Ok(())
        } else {
            Err(KyamaError::Unauthorized {
                required: Role::Primary,
            })
        }
    }

    fn ensure_secondary(&self, caller: Address) -> Result<()> {
        if self.is_secondary(caller) {
            Ok(())
        } else {
            Err(KyamaError::Unauthorized {
                required: Role::Secondary,
            })
        }
    }

    fn ensure_administrator(&self, caller: Address) -> Result<()> {
        if self.is_primary(caller) || self.is_secondary(caller) {
            Ok(())
        } else {
            Err(KyamaError::Unauthorized {
                required: Role::Administrator,
            })
        }
    }
}

/// Administrator identities and the single shared operational flag.
///
/// Invariant: `primary != secondary`, neither is the zero address.
#[derive(Debug, Clone)]
pub struct AccessControl {
    primary: Address,
    secondary: Address,
    operational: bool,
}

impl AccessControl {
    /// Create the admin state. The system starts operational.
    pub fn new(primary: Address, secondary: Address) -> Result<Self> {
        if primary.is_zero() {
            return Err(KyamaError::InvalidAddress {
                role: Role::Primary,
            });
        }
        if secondary.is_zero() {
            return Err(KyamaError::InvalidAddress {
                role: Role::Secondary,
            });
        }
        if primary == secondary {
            return Err(KyamaError::AlreadyAdmin {
                role: Role::Secondary,
            });
        }
        Ok(Self {
            primary,
            secondary,
            operational: true,
        })
    }

    #[must_use]
    pub fn primary(&self) -> Address {
        self.primary
    }

    #[must_use]
    pub fn secondary(&self) -> Address {
        self.secondary
    }

    /// Hand the primary seat to `new`. Returns the previous primary.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the primary
    /// - `InvalidAddress` if `new` is the zero address
    /// - `AlreadyAdmin` if `new` already holds either seat
    pub fn set_primary(&mut self, caller: Address, new: Address) -> Result<Address> {
        self.ensure_primary(caller)?;
        self.check_candidate(new, Role::Primary)?;
        let previous = std::mem::replace(&mut self.primary, new);
        tracing::info!(from = %previous, to = %new, "Primary administrator changed");
        Ok(previous)
    }

    /// Hand the secondary seat to `new`. Returns the previous secondary.
    ///
    /// Same constraints as [`Self::set_primary`]; authorized by the primary.
    pub fn set_secondary(&mut self, caller: Address, new: Address) -> Result<Address> {
        self.ensure_primary(caller)?;
        self.check_candidate(new, Role::Secondary)?;
        let previous = std::mem::replace(&mut self.secondary, new);
        tracing::info!(from = %previous, to = %new, "Secondary administrator changed");
        Ok(previous)
    }

    /// Halt every mutating operation. Either administrator may pause.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is an administrator
    /// - `AlreadyPaused` if the system is already paused
    pub fn pause(&mut self, caller: Address) -> Result<()> {
        if let Err(err) = self.ensure_administrator(caller) {
            tracing::warn!(caller = %caller, "Pause rejected: not an administrator");
            return Err(err);
        }
        if !self.operational {
            return Err(KyamaError::AlreadyPaused);
        }
        self.operational = false;
        tracing::info!(by = %caller, "System paused");
        Ok(())
    }

    /// Restart the system. Only the primary may resume.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the primary
    /// - `NotPaused` if the system is operational
    pub fn resume(&mut self, caller: Address) -> Result<()> {
        if let Err(err) = self.ensure_primary(caller) {
            tracing::warn!(caller = %caller, "Resume rejected: not the primary administrator");
            return Err(err);
        }
        if self.operational {
            return Err(KyamaError::NotPaused);
        }
        self.operational = true;
        tracing::info!(by = %caller, "System resumed");
        Ok(())
    }

    fn check_candidate(&self, new: Address, role: Role) -> Result<()> {
        if new.is_zero() {
            return Err(KyamaError::InvalidAddress { role });
        }
        if new == self.primary || new == self.secondary {
            return Err(KyamaError::AlreadyAdmin { role });
        }
        Ok(())
    }
}

impl CircuitBreaker for AccessControl {
    fn is_operational(&self) -> bool {
        self.operational
    }

    fn is_primary(&self, caller: Address) -> bool {
        caller == self.primary
    }

    fn is_secondary(&self, caller: Address) -> bool {
        caller == self.secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CEO: u8 = 1;
    const CFO: u8 = 2;

    fn setup() -> AccessControl {
        AccessControl::new(Address::numbered(CEO), Address::numbered(CFO)).unwrap()
    }

    #[test]
    fn starts_operational() {
        let ac = setup();
        assert!(ac.is_operational());
        assert_eq!(ac.primary(), Address::numbered(CEO));
        assert_eq!(ac.secondary(), Address::numbered(CFO));
    }

    #[test]
    fn new_rejects_zero_and_duplicate_admins() {
        assert!(matches!(
            AccessControl::new(Address::ZERO, Address::numbered(2)),
            Err(KyamaError::InvalidAddress { role: Role::Primary })
        ));
        assert!(matches!(
            AccessControl::new(Address::numbered(1), Address::ZERO),
            Err(KyamaError::InvalidAddress { role: Role::Secondary })
        ));
        assert!(matches!(
            AccessControl::new(Address::numbered(1), Address::numbered(1)),
            Err(KyamaError::AlreadyAdmin { .. })
        ));
    }

    #[test]
    fn primary_can_hand_over_primary_seat() {
        let mut ac = setup();
        let old = ac
            .set_primary(Address::numbered(CEO), Address::numbered(3))
            .unwrap();
        assert_eq!(old, Address::numbered(CEO));
        assert_eq!(ac.primary(), Address::numbered(3));
    }

    #[test]
    fn zero_address_cannot_become_admin() {
        let mut ac = setup();
        let err = ac
            .set_primary(Address::numbered(CEO), Address::ZERO)
            .unwrap_err();
        assert!(matches!(err, KyamaError::InvalidAddress { role: Role::Primary }));
        let err = ac
            .set_secondary(Address::numbered(CEO), Address::ZERO)
            .unwrap_err();
        assert!(matches!(err, KyamaError::InvalidAddress { role: Role::Secondary }));
    }

    #[test]
    fn secondary_and_strangers_cannot_change_admins() {
        let mut ac = setup();
        for caller in [Address::numbered(CFO), Address::numbered(8)] {
            let err = ac.set_primary(caller, Address::numbered(9)).unwrap_err();
            assert!(matches!(err, KyamaError::Unauthorized { required: Role::Primary }));
            let err = ac.set_secondary(caller, Address::numbered(9)).unwrap_err();
            assert!(matches!(err, KyamaError::Unauthorized { required: Role::Primary }));
        }
    }

    #[test]
    fn current_admins_cannot_be_reassigned() {
        let mut ac = setup();
        let ceo = Address::numbered(CEO);
        let cfo = Address::numbered(CFO);
        assert!(matches!(
            ac.set_secondary(ceo, ceo),
            Err(KyamaError::AlreadyAdmin { .. })
        ));
        assert!(matches!(
            ac.set_secondary(ceo, cfo),
            Err(KyamaError::AlreadyAdmin { .. })
        ));
        assert!(matches!(
            ac.set_primary(ceo, cfo),
            Err(KyamaError::AlreadyAdmin { .. })
        ));
        assert!(matches!(
            ac.set_primary(ceo, ceo),
            Err(KyamaError::AlreadyAdmin { .. })
        ));
    }

    #[test]
    fn either_admin_can_pause() {
        let mut ac = setup();
        ac.pause(Address::numbered(CEO)).unwrap();
        assert!(!ac.is_operational());
        ac.resume(Address::numbered(CEO)).unwrap();

        ac.pause(Address::numbered(CFO)).unwrap();
        assert!(!ac.is_operational());
    }

    #[test]
    fn pause_twice_fails() {
        let mut ac = setup();
        ac.pause(Address::numbered(CEO)).unwrap();
        let err = ac.pause(Address::numbered(CEO)).unwrap_err();
        assert!(matches!(err, KyamaError::AlreadyPaused));
    }

    #[test]
    fn stranger_cannot_pause() {
        let mut ac = setup();
        let err = ac.pause(Address::numbered(9)).unwrap_err();
        assert!(matches!(
            err,
            KyamaError::Unauthorized {
                required: Role::Administrator
            }
        ));
        assert!(ac.is_operational());
    }

    #[test]
    fn only_primary_resumes() {
        let mut ac = setup();
        ac.pause(Address::numbered(CFO)).unwrap();
        let err = ac.resume(Address::numbered(CFO)).unwrap_err();
        assert!(matches!(err, KyamaError::Unauthorized { required: Role::Primary }));
        assert!(!ac.is_operational());
        ac.resume(Address::numbered(CEO)).unwrap();
        assert!(ac.is_operational());
    }

    #[test]
    fn resume_while_operational_fails() {
        let mut ac = setup();
        let err = ac.resume(Address::numbered(CEO)).unwrap_err();
        assert!(matches!(err, KyamaError::NotPaused));
        // Authorization is checked before state.
        let err = ac.resume(Address::numbered(9)).unwrap_err();
        assert!(matches!(err, KyamaError::Unauthorized { .. }));
    }

    #[test]
    fn admin_changes_allowed_while_paused() {
        let mut ac = setup();
        ac.pause(Address::numbered(CEO)).unwrap();
        ac.set_secondary(Address::numbered(CEO), Address::numbered(4))
            .unwrap();
        assert_eq!(ac.secondary(), Address::numbered(4));
    }

    #[test]
    fn ensure_operational_tracks_flag() {
        let mut ac = setup();
        assert!(ac.ensure_operational().is_ok());
        ac.pause(Address::numbered(CFO)).unwrap();
        assert!(matches!(
            ac.ensure_operational(),
            Err(KyamaError::NotOperational)
        ));
    }
}
