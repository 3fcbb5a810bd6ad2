//! Session admission decisions derived from the configuration snapshot.

use thiserror::Error;

use crate::config::{AllowedModes, IdList, RepeaterConfig, RepeaterMode};

/// Reason a pairing request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionDenied {
    #[error("{0} is not allowed by this repeater")]
    ModeNotAllowed(RepeaterMode),

    #[error("connection ID {0} is not in the allow-list")]
    IdNotListed(u32),

    #[error("session limit of {max} reached")]
    SessionLimitReached { max: u32 },
}

/// Admission rules taken from a [`RepeaterConfig`].
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    allowed_modes: AllowedModes,
    require_listed_id: bool,
    id_list: IdList,
    max_sessions: u32,
}

impl AdmissionPolicy {
    pub fn from_config(config: &RepeaterConfig) -> Self {
        Self {
            allowed_modes: config.allowed_modes,
            require_listed_id: config.require_listed_id,
            id_list: config.id_list.clone(),
            max_sessions: config.max_sessions,
        }
    }

    pub fn check_mode(&self, mode: RepeaterMode) -> Result<(), AdmissionDenied> {
        if self.allowed_modes.contains(mode) {
            Ok(())
        } else {
            Err(AdmissionDenied::ModeNotAllowed(mode))
        }
    }

    /// Check a mode 2 connection ID against the allow-list.
    ///
    /// Any ID passes unless listing is required.
    pub fn check_id(&self, id: u32) -> Result<(), AdmissionDenied> {
        if !self.require_listed_id || self.id_list.contains(id) {
            Ok(())
        } else {
            tracing::debug!(id, "Rejecting unlisted connection ID");
            Err(AdmissionDenied::IdNotListed(id))
        }
    }

    /// Check whether one more session fits next to `active` running ones.
    pub fn check_session_capacity(&self, active: usize) -> Result<(), AdmissionDenied> {
        if self.max_sessions == 0 || active < self.max_sessions as usize {
            Ok(())
        } else {
            Err(AdmissionDenied::SessionLimitReached {
                max: self.max_sessions,
            })
        }
    }

    /// Run every check that applies to a request in `mode`.
    pub fn admit(
        &self,
        mode: RepeaterMode,
        id: Option<u32>,
        active: usize,
    ) -> Result<(), AdmissionDenied> {
        self.check_mode(mode)?;
        if let (RepeaterMode::IdBased, Some(id)) = (mode, id) {
            self.check_id(id)?;
        }
        self.check_session_capacity(active)
    }
}
