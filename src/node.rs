use crate::card::*;
use crate::mutex_like::*;
use crate::sliceop::*;
use crate::tree::Action;

#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicU32, Ordering};

// Discounting parameters applied to the accumulators (discounted CFR).
const ALPHA: f32 = 1.5;
const GAMMA: f32 = 4.0;

/// A node of the game tree.
///
/// The variant set is closed and dispatched exhaustively: an action node
/// (a player decision), a chance node (a community-card reveal), or a
/// terminal node. Subtrees are owned by their parent; a walk call only ever
/// borrows the tree.
pub enum Node {
    Action(ActionNode),
    Chance(ChanceNode),
    Terminal(TerminalNode),
}

/// A chance node: one child per possible revealed card. Immutable after
/// construction.
pub struct ChanceNode {
    pub children: Vec<(Card, Node)>,
}

/// The way a terminal node awards the pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Both players are all-in with community cards still to come.
    Allin,
    /// A player folded.
    Uncontested,
    /// Hands are compared on a complete board.
    Showdown,
}

/// A terminal node. `value` is the amount transferred on a clean win, in
/// pot units; `last_to_act` identifies the folding player for
/// [`TerminalKind::Uncontested`].
pub struct TerminalNode {
    pub kind: TerminalKind,
    pub value: f32,
    pub last_to_act: usize,
}

/// A player decision node.
///
/// The two accumulators (cumulative regret and cumulative weighted
/// strategy) are laid out action-major: entry `action * num_hands + hand`.
/// They are the only mutable state the traversal touches, and the tree
/// topology guarantees a single active visitor per node, so they sit behind
/// [`MutexLike`] rather than a real lock; debug builds verify the
/// discipline with an atomic visitor counter.
pub struct ActionNode {
    pub player: usize,
    pub num_hands: usize,
    pub actions: Vec<Action>,
    pub children: Vec<Node>,
    regrets: MutexLike<Vec<f32>>,
    strategy_sum: MutexLike<Vec<f32>>,
    #[cfg(debug_assertions)]
    visitors: AtomicU32,
}

/// Computes a strategy from cumulative regrets: each hand plays every
/// action proportionally to its positive regret, or uniformly when no
/// action has positive regret.
fn regret_matching(regrets: &[f32], num_actions: usize, num_hands: usize) -> Vec<f32> {
    let mut strategy: Vec<f32> = regrets.iter().map(|r| r.max(0.0)).collect();

    let mut denom = vec![0.0; num_hands];
    for action in 0..num_actions {
        add_slice(&mut denom, row(&strategy, action, num_hands));
    }

    let default = 1.0 / num_actions as f32;
    for action in 0..num_actions {
        row_mut(&mut strategy, action, num_hands)
            .iter_mut()
            .zip(&denom)
            .for_each(|(s, &d)| *s = if d > 0.0 { *s / d } else { default });
    }

    strategy
}

impl ActionNode {
    pub(crate) fn new(
        player: usize,
        num_hands: usize,
        actions: Vec<Action>,
        children: Vec<Node>,
    ) -> Self {
        let len = children.len() * num_hands;
        Self {
            player,
            num_hands,
            actions,
            children,
            regrets: MutexLike::new(vec![0.0; len]),
            strategy_sum: MutexLike::new(vec![0.0; len]),
            #[cfg(debug_assertions)]
            visitors: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn num_actions(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn child(&self, action: usize) -> &Node {
        &self.children[action]
    }

    /// Returns the current regret-matched strategy, action-major.
    pub fn current_strategy(&self) -> Vec<f32> {
        regret_matching(&self.regrets.lock(), self.num_actions(), self.num_hands)
    }

    /// Returns the normalized average strategy, action-major. This is the
    /// strategy that converges toward equilibrium.
    pub fn average_strategy(&self) -> Vec<f32> {
        let strategy_sum = self.strategy_sum.lock();
        let num_actions = self.num_actions();
        let mut strategy = strategy_sum.clone();

        let mut denom = vec![0.0; self.num_hands];
        for action in 0..num_actions {
            add_slice(&mut denom, row(&strategy, action, self.num_hands));
        }

        let default = 1.0 / num_actions as f32;
        for action in 0..num_actions {
            row_mut(&mut strategy, action, self.num_hands)
                .iter_mut()
                .zip(&denom)
                .for_each(|(s, &d)| *s = if d > 0.0 { *s / d } else { default });
        }

        strategy
    }

    /// First phase of the regret update: accumulates one action's raw EV
    /// vector.
    pub fn update_regrets(&self, action_evs: &[f32], action: usize) {
        let mut regrets = self.regrets.lock();
        add_slice(row_mut(&mut regrets, action, self.num_hands), action_evs);
    }

    /// Second phase of the regret update: subtracts the EV of the combined
    /// strategy from every action's row, then applies the iteration
    /// discount (positive regrets scale by `t^α / (t^α + 1)`, negative ones
    /// by `1/2`).
    pub fn finalize_regrets(&self, combined_evs: &[f32], iteration: u32) {
        let mut regrets = self.regrets.lock();
        for action in 0..self.num_actions() {
            row_mut(&mut regrets, action, self.num_hands)
                .iter_mut()
                .zip(combined_evs)
                .for_each(|(r, &ev)| *r -= ev);
        }

        let t_alpha = (iteration as f32).powf(ALPHA);
        let alpha_t = t_alpha / (t_alpha + 1.0);
        let beta_t = 0.5;
        regrets
            .iter_mut()
            .for_each(|r| *r *= if *r >= 0.0 { alpha_t } else { beta_t });
    }

    /// Adds the current strategy, weighted by the acting player's reach
    /// probabilities and the iteration weight `t^γ`, into the cumulative
    /// strategy.
    pub fn update_strategy_sum(&self, strategy: &[f32], reach_probs: &[f32], iteration: u32) {
        let gamma_t = (iteration as f32).powf(GAMMA);
        let mut strategy_sum = self.strategy_sum.lock();
        for action in 0..self.num_actions() {
            let strategy_row = row(strategy, action, self.num_hands);
            row_mut(&mut strategy_sum, action, self.num_hands)
                .iter_mut()
                .zip(strategy_row.iter().zip(reach_probs))
                .for_each(|(sum, (&s, &reach))| *sum += s * reach * gamma_t);
        }
    }

    /// Marks this node as visited; debug builds panic if another traversal
    /// call is already inside it.
    #[inline]
    pub(crate) fn enter(&self) {
        #[cfg(debug_assertions)]
        {
            let prev = self.visitors.fetch_add(1, Ordering::SeqCst);
            assert_eq!(prev, 0, "action node entered by two concurrent calls");
        }
    }

    #[inline]
    pub(crate) fn leave(&self) {
        #[cfg(debug_assertions)]
        self.visitors.fetch_sub(1, Ordering::SeqCst);
    }
}
