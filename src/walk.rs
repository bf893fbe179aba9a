use crate::card::*;
use crate::equity::*;
use crate::node::*;
use crate::range_manager::*;
use crate::sliceop::*;
use crate::utility::*;

/// The policy seam between the two traversal instantiations.
///
/// The CFR pass and the best-response pass share every part of the walk
/// except the action-node combination step: which strategy weights the
/// villain's actions, how hero's per-action EVs are combined, and what (if
/// anything) is accumulated on the node afterwards.
pub(crate) trait TraversalMode: Sync {
    /// Strategy used to weight the villain's actions at this node,
    /// action-major.
    fn villain_strategy(&self, node: &ActionNode) -> Vec<f32>;

    /// Combines the per-action hero EV vectors at a hero-to-act node into
    /// the node's EV vector, performing any accumulator updates the policy
    /// requires.
    fn combine_hero(&self, node: &ActionNode, action_evs: Vec<Vec<f32>>) -> Vec<f32>;

    /// Called once a villain-to-act fan-out has completed.
    fn villain_visited(&self, _node: &ActionNode, _strategy: &[f32], _villain_reach: &[f32]) {}
}

/// One traversal of the game tree for a fixed hero seat.
///
/// A walk call is synchronous: children of every combination point are
/// computed concurrently and joined before their parent combines them, and
/// the call returns hero's per-hand EV vector for the node it was given.
/// The range manager is only read; action-node accumulators are the only
/// state written, under the one-visitor-per-node discipline.
pub(crate) struct TreeWalk<'a, M: TraversalMode> {
    pub range_manager: &'a RangeManager,
    pub hero: usize,
    pub villain: usize,
    pub mode: M,
}

impl<M: TraversalMode> TreeWalk<'_, M> {
    /// Walks the tree from `root` at the manager's initial board, starting
    /// from the villain's initial reach probabilities.
    pub fn run(&self, root: &Node) -> Vec<f32> {
        let board = *self.range_manager.initial_board();
        let villain_reach = self.range_manager.initial_reach_probs(self.villain);
        self.walk(root, &villain_reach, &board)
    }

    pub fn walk(&self, node: &Node, villain_reach: &[f32], board: &Board) -> Vec<f32> {
        match node {
            Node::Terminal(terminal) => self.terminal_utility(terminal, villain_reach, board),
            Node::Chance(chance) => self.chance_utility(chance, villain_reach, board),
            Node::Action(action) => self.action_utility(action, villain_reach, board),
        }
    }

    fn action_utility(&self, node: &ActionNode, villain_reach: &[f32], board: &Board) -> Vec<f32> {
        node.enter();
        let num_actions = node.num_actions();

        let result = if node.player == self.hero {
            // hero's decision: every action sees the same villain reach
            let action_evs = map_indices(num_actions, |action| {
                self.walk(node.child(action), villain_reach, board)
            });
            self.mode.combine_hero(node, action_evs)
        } else {
            // villain's decision: fold their strategy into the reach
            // probabilities handed to each subtree, then sum
            let strategy = self.mode.villain_strategy(node);
            let num_villain = node.num_hands;
            let action_reach: Vec<Vec<f32>> = (0..num_actions)
                .map(|action| {
                    let mut reach = row(&strategy, action, num_villain).to_vec();
                    mul_slice(&mut reach, villain_reach);
                    reach
                })
                .collect();

            let action_evs = map_indices(num_actions, |action| {
                self.walk(node.child(action), &action_reach[action], board)
            });

            let mut result = vec![0.0; self.range_manager.num_hands(self.hero, board)];
            for evs in &action_evs {
                add_slice(&mut result, evs);
            }
            self.mode.villain_visited(node, &strategy, villain_reach);
            result
        };

        node.leave();
        result
    }

    fn chance_utility(&self, node: &ChanceNode, villain_reach: &[f32], board: &Board) -> Vec<f32> {
        let reveals_turn = board[3] == NOT_DEALT;
        let slot = if reveals_turn { 3 } else { 4 };

        let child_boards: Vec<Board> = node
            .children
            .iter()
            .map(|&(card, _)| {
                let mut child_board = *board;
                child_board[slot] = card;
                child_board
            })
            .collect();

        let results = map_indices(node.children.len(), |i| {
            let child_board = &child_boards[i];
            let reach = self
                .range_manager
                .reach_probs(self.villain, child_board, villain_reach);
            self.walk(&node.children[i].1, &reach, child_board)
        });

        // each child's hand set is a reindexed subset of this board's, so
        // scattering through the index map is a plain accumulate
        let mut utilities = vec![0.0; self.range_manager.num_hands(self.hero, board)];
        for (child_board, result) in child_boards.iter().zip(&results) {
            let index_map = self.range_manager.index_map(self.hero, child_board);
            for (k, &value) in result.iter().enumerate() {
                utilities[index_map[k] as usize] += value;
            }
        }

        let num_outcomes = if reveals_turn { 45.0 } else { 44.0 };
        mul_slice_scalar(&mut utilities, 1.0 / num_outcomes);
        utilities
    }

    fn terminal_utility(
        &self,
        node: &TerminalNode,
        villain_reach: &[f32],
        board: &Board,
    ) -> Vec<f32> {
        match node.kind {
            TerminalKind::Showdown => showdown_equities(
                self.range_manager.hands(self.hero, board),
                self.range_manager.hands(self.villain, board),
                villain_reach,
                node.value,
            ),
            TerminalKind::Uncontested => {
                let signed_value = if self.hero == node.last_to_act {
                    -node.value
                } else {
                    node.value
                };
                uncontested_equities(
                    self.range_manager.hands(self.hero, board),
                    self.range_manager.hands(self.villain, board),
                    villain_reach,
                    self.range_manager.same_hand_index(self.hero, board),
                    signed_value,
                )
            }
            TerminalKind::Allin => {
                if board[3] != NOT_DEALT {
                    self.allin_rivers(node, villain_reach, board)
                } else {
                    self.allin_runouts(node, villain_reach, board)
                }
            }
        }
    }

    /// All-in with only the river to come: average the showdown over every
    /// undealt river card.
    fn allin_rivers(&self, node: &TerminalNode, villain_reach: &[f32], board: &Board) -> Vec<f32> {
        let rivers: Vec<Card> = (0..52).filter(|&c| !board_contains(board, c)).collect();

        let results = map_indices(rivers.len(), |i| {
            let mut river_board = *board;
            river_board[4] = rivers[i];
            let reach = self
                .range_manager
                .reach_probs(self.villain, &river_board, villain_reach);
            let evs = showdown_equities(
                self.range_manager.hands(self.hero, &river_board),
                self.range_manager.hands(self.villain, &river_board),
                &reach,
                node.value,
            );
            (river_board, evs)
        });

        let mut utilities = vec![0.0; self.range_manager.num_hands(self.hero, board)];
        for (river_board, evs) in &results {
            let index_map = self.range_manager.index_map(self.hero, river_board);
            for (k, &value) in evs.iter().enumerate() {
                utilities[index_map[k] as usize] += value;
            }
        }

        mul_slice_scalar(&mut utilities, 1.0 / 44.0);
        utilities
    }

    /// All-in with turn and river to come: one showdown per unordered pair
    /// of undealt cards. Deal order cannot change the final board, but both
    /// orders are live draws, so each pair scatters with weight 2 and the
    /// total divides by the 45 * 44 ordered draws.
    fn allin_runouts(&self, node: &TerminalNode, villain_reach: &[f32], board: &Board) -> Vec<f32> {
        let undealt: Vec<Card> = (0..52).filter(|&c| !board_contains(board, c)).collect();

        let mut pairs = Vec::with_capacity(undealt.len() * (undealt.len() - 1) / 2);
        for (i, &turn) in undealt.iter().enumerate() {
            for &river in &undealt[i + 1..] {
                pairs.push((turn, river));
            }
        }

        let results = map_indices(pairs.len(), |i| {
            let (turn, river) = pairs[i];
            let mut runout_board = *board;
            runout_board[3] = turn;
            let turn_reach = self
                .range_manager
                .reach_probs(self.villain, &runout_board, villain_reach);
            runout_board[4] = river;
            let river_reach = self
                .range_manager
                .reach_probs(self.villain, &runout_board, &turn_reach);
            showdown_equities(
                self.range_manager.hands(self.hero, &runout_board),
                self.range_manager.hands(self.villain, &runout_board),
                &river_reach,
                node.value,
            )
        });

        let mut utilities = vec![0.0; self.range_manager.num_hands(self.hero, board)];
        let mut pair_index = 0;
        for (i, &turn) in undealt.iter().enumerate() {
            let mut turn_board = *board;
            turn_board[3] = turn;
            let turn_map = self.range_manager.index_map(self.hero, &turn_board);
            let mut turn_utilities = vec![0.0; turn_map.len()];

            for &river in &undealt[i + 1..] {
                let mut river_board = turn_board;
                river_board[4] = river;
                let river_map = self.range_manager.index_map(self.hero, &river_board);
                let evs = &results[pair_index];
                pair_index += 1;
                for (k, &value) in evs.iter().enumerate() {
                    turn_utilities[river_map[k] as usize] += value;
                }
            }

            for (k, &value) in turn_utilities.iter().enumerate() {
                utilities[turn_map[k] as usize] += 2.0 * value;
            }
        }

        mul_slice_scalar(&mut utilities, 1.0 / 1980.0);
        utilities
    }
}
