//! Per-order decision records.
//!
//! The adjudicator keeps one `OrderState` per order in play, stored in an
//! arena and addressed by index. Every field only ever moves in one
//! direction during a phase:
//!
//! - `eval` leaves `Uncertain` at most once;
//! - `dislodged` advances `No -> Maybe -> Yes`;
//! - `*_max` strengths only shrink and `*_certain` strengths only grow;
//! - `verified` only goes from false to true.
//!
//! That monotonicity is what lets evaluation passes be repeated in any
//! order and still reach the same fixed point.

use crate::board::{Order, PowerId, ProvinceId};

use super::adjudicator::AdjudicationError;

/// Upper bound every `*_max` strength starts from.
pub const STRENGTH_UNBOUNDED: i32 = 9999;

/// Outcome of an order, or of a convoy route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate {
    Uncertain,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DislodgedState {
    No,
    Maybe,
    Yes,
}

/// Why an order failed, kept for the result log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailReason {
    /// Beaten or stood off by a unit coming from (or holding) a province.
    Bounced(ProvinceId),
    /// Support cut by an attack from a province.
    Cut(ProvinceId),
    Dislodged,
    NoConvoyRoute,
    /// Would have dislodged a unit of its own power.
    OwnUnit,
    /// The supported or convoyed unit did not give the matching order.
    Unmatched,
    /// Forced to fail to break a convoy paradox.
    ConvoyParadox,
    /// Retreat into a province another retreat also targeted.
    Standoff,
    /// More builds or removals than the power is entitled to.
    OverLimit,
}

macro_rules! typed_ref {
    ($(#[$doc:meta])* $name:ident, $check:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Wraps `index` if the order stored there has the right kind.
            pub(crate) fn of(states: &[OrderState], index: usize) -> Option<Self> {
                states
                    .get(index)
                    .filter(|s| s.order.$check())
                    .map(|_| $name(index))
            }

            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

typed_ref!(
    /// Index of a Support order's state.
    SupportRef,
    is_support
);
typed_ref!(
    /// Index of a Move (or, in the retreat phase, Retreat) order's state.
    MoveRef,
    is_movement
);
typed_ref!(
    /// Index of a Convoy order's state.
    ConvoyRef,
    is_convoy
);

impl Order {
    fn is_movement(&self) -> bool {
        matches!(self, Order::Move { .. } | Order::Retreat { .. })
    }
}

/// Orders whose outcome feeds into this order's strength or result.
/// Filled in once, before verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    /// Supports for this order (move supports for a Move, hold supports
    /// for everything else).
    pub supports: Vec<SupportRef>,
    /// The subset of `supports` given by the power whose unit stands at a
    /// Move's destination.
    pub self_supports: Vec<SupportRef>,
    /// Moves into this order's own province.
    pub moves_to_source: Vec<MoveRef>,
    /// Other moves (or retreats) into this order's destination.
    pub moves_to_destination: Vec<MoveRef>,
    /// Convoys ordered for this Move.
    pub convoys: Vec<ConvoyRef>,
}

#[derive(Debug, Clone)]
pub struct OrderState {
    pub(crate) order: Order,
    power: PowerId,
    eval: Tristate,
    reason: Option<FailReason>,
    dislodged: DislodgedState,
    dislodged_by: Option<MoveRef>,
    defense_max: i32,
    defense_certain: i32,
    attack_max: i32,
    attack_certain: i32,
    self_support_attack_max: i32,
    self_support_attack_certain: i32,
    retreat_strength: Option<i32>,
    circular: bool,
    head_to_head: Option<MoveRef>,
    convoyed: bool,
    convoy_paradox: bool,
    verified: bool,
    legal: bool,
    deps: Dependencies,
    linked: bool,
}

impl OrderState {
    pub fn new(order: Order, power: PowerId, legal: bool) -> Self {
        OrderState {
            order,
            power,
            eval: Tristate::Uncertain,
            reason: None,
            dislodged: DislodgedState::No,
            dislodged_by: None,
            defense_max: STRENGTH_UNBOUNDED,
            defense_certain: 0,
            attack_max: STRENGTH_UNBOUNDED,
            attack_certain: 0,
            self_support_attack_max: STRENGTH_UNBOUNDED,
            self_support_attack_certain: 0,
            retreat_strength: None,
            circular: false,
            head_to_head: None,
            convoyed: false,
            convoy_paradox: false,
            verified: false,
            legal,
            deps: Dependencies::default(),
            linked: false,
        }
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn power(&self) -> PowerId {
        self.power
    }

    pub fn eval(&self) -> Tristate {
        self.eval
    }

    pub fn is_resolved(&self) -> bool {
        self.eval != Tristate::Uncertain
    }

    pub fn reason(&self) -> Option<FailReason> {
        self.reason
    }

    /// Resolves the order. Returns an error if it was already resolved.
    pub fn set_eval(
        &mut self,
        eval: Tristate,
        reason: Option<FailReason>,
    ) -> Result<(), AdjudicationError> {
        if eval == Tristate::Uncertain {
            return Ok(());
        }
        if self.eval != Tristate::Uncertain {
            return Err(AdjudicationError::EvalReassigned {
                province: self.order.source(),
                from: self.eval,
                to: eval,
            });
        }
        self.eval = eval;
        self.reason = reason;
        Ok(())
    }

    pub fn dislodged(&self) -> DislodgedState {
        self.dislodged
    }

    pub fn dislodged_by(&self) -> Option<MoveRef> {
        self.dislodged_by
    }

    /// Advances the dislodged state. Going backwards is ignored. Returns
    /// whether anything changed.
    pub fn set_dislodged(&mut self, state: DislodgedState, by: MoveRef) -> bool {
        if state <= self.dislodged {
            return false;
        }
        self.dislodged = state;
        self.dislodged_by = Some(by);
        true
    }

    pub fn defense_max(&self) -> i32 {
        self.defense_max
    }

    pub fn defense_certain(&self) -> i32 {
        self.defense_certain
    }

    pub fn attack_max(&self) -> i32 {
        self.attack_max
    }

    pub fn attack_certain(&self) -> i32 {
        self.attack_certain
    }

    pub fn self_support_attack_max(&self) -> i32 {
        self.self_support_attack_max
    }

    pub fn self_support_attack_certain(&self) -> i32 {
        self.self_support_attack_certain
    }

    pub fn tighten_defense(&mut self, max: i32, certain: i32) -> bool {
        tighten(&mut self.defense_max, &mut self.defense_certain, max, certain)
    }

    /// Attack strength against the unit at the destination, without
    /// supports from that unit's own power.
    pub fn tighten_attack(&mut self, max: i32, certain: i32) -> bool {
        tighten(&mut self.attack_max, &mut self.attack_certain, max, certain)
    }

    /// Attack strength counting every support, used to prevent other moves
    /// and in head-to-head battles.
    pub fn tighten_self_support_attack(&mut self, max: i32, certain: i32) -> bool {
        tighten(
            &mut self.self_support_attack_max,
            &mut self.self_support_attack_certain,
            max,
            certain,
        )
    }

    pub fn retreat_strength(&self) -> Option<i32> {
        self.retreat_strength
    }

    pub fn set_retreat_strength(&mut self, strength: i32) -> bool {
        if self.retreat_strength.is_some() {
            return false;
        }
        self.retreat_strength = Some(strength.max(0));
        true
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    pub(crate) fn mark_circular(&mut self) {
        self.circular = true;
    }

    pub fn head_to_head(&self) -> Option<MoveRef> {
        self.head_to_head
    }

    pub(crate) fn set_head_to_head(&mut self, other: MoveRef) {
        self.head_to_head = Some(other);
    }

    /// Whether this Move travels by convoy.
    pub fn is_convoyed(&self) -> bool {
        self.convoyed
    }

    pub(crate) fn set_convoyed(&mut self, convoyed: bool) {
        self.convoyed = convoyed;
    }

    /// Whether this Move was failed by the Szykman rule.
    pub fn is_convoy_paradox(&self) -> bool {
        self.convoy_paradox
    }

    /// Returns whether the flag was newly set.
    pub(crate) fn mark_convoy_paradox(&mut self) -> bool {
        !std::mem::replace(&mut self.convoy_paradox, true)
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn mark_verified(&mut self) -> bool {
        let changed = !self.verified;
        self.verified = true;
        changed
    }

    pub fn is_legal(&self) -> bool {
        self.legal
    }

    pub fn deps(&self) -> &Dependencies {
        &self.deps
    }

    pub fn set_dependencies(&mut self, deps: Dependencies) -> Result<(), AdjudicationError> {
        if self.linked {
            return Err(AdjudicationError::DependenciesRelinked {
                province: self.order.source(),
            });
        }
        self.deps = deps;
        self.linked = true;
        Ok(())
    }
}

fn tighten(max: &mut i32, certain: &mut i32, new_max: i32, new_certain: i32) -> bool {
    let mut changed = false;
    if new_max < *max {
        *max = new_max;
        changed = true;
    }
    if new_certain > *certain {
        *certain = new_certain;
        changed = true;
    }
    debug_assert!(*certain <= *max, "certain strength exceeds max");
    changed
}
