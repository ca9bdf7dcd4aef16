// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `mode`/`phase` knobs a session is configured with.

use mcpf_core::Phase;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which targets the strategy manager draws cases from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Fuzz discovered tools only.
    Tools,
    /// Fuzz the baked-in protocol method catalog only.
    Protocol,
    /// Fuzz both.
    Both,
}

impl Mode {
    pub(crate) fn includes_tools(self) -> bool {
        matches!(self, Mode::Tools | Mode::Both)
    }

    pub(crate) fn includes_protocol(self) -> bool {
        matches!(self, Mode::Protocol | Mode::Both)
    }
}

/// Which generation phase(s) a session restricts itself to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseSelection {
    /// Schema-conforming cases only.
    Realistic,
    /// Hostile/mutated cases only.
    Aggressive,
    /// Both phases, realistic then aggressive (the default).
    #[default]
    Both,
}

impl PhaseSelection {
    pub(crate) fn matches(self, phase: Phase) -> bool {
        match self {
            PhaseSelection::Both => true,
            PhaseSelection::Realistic => phase == Phase::Realistic,
            PhaseSelection::Aggressive => phase == Phase::Aggressive,
        }
    }
}
