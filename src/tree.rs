use crate::card::*;
use crate::node::*;
use crate::range_manager::*;
use std::collections::BTreeSet;

/// Available actions of the betting tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(i32),
    Raise(i32),
    AllIn(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Street {
    Flop,
    Turn,
    River,
}

impl Street {
    #[inline]
    fn next(self) -> Street {
        match self {
            Street::Flop => Street::Turn,
            Street::Turn => Street::River,
            Street::River => unreachable!(),
        }
    }
}

/// A struct containing the game-tree configuration.
///
/// # Examples
/// ```
/// use subgame_solver::TreeConfig;
///
/// let config = TreeConfig {
///     starting_pot: 100,
///     effective_stack: 200,
///     bet_sizes: vec![0.5, 1.0],
///     raise_cap: 2,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Starting pot size. Must be greater than `0`.
    pub starting_pot: i32,

    /// Effective stack behind each player. Must be greater than `0`.
    pub effective_stack: i32,

    /// Bet and raise size candidates as fractions of the pot. A size that
    /// meets or exceeds the remaining stack becomes an all-in.
    pub bet_sizes: Vec<f32>,

    /// Maximum number of raises per betting round.
    pub raise_cap: u8,
}

#[derive(Clone, Copy)]
struct BuildState {
    board: Board,
    street: Street,
    to_act: usize,
    committed: [i32; 2],
    raises: u8,
    opponent_checked: bool,
}

/// Builds the game tree for the range manager's initial board.
///
/// Out-of-position (player 0) acts first on every street. Terminal `value`
/// is half the final pot: the starting pot's half plus the chips matched by
/// the losing side.
pub fn build_tree(config: &TreeConfig, range_manager: &RangeManager) -> Result<Node, String> {
    if config.starting_pot <= 0 {
        return Err("Starting pot must be positive".to_string());
    }
    if config.effective_stack <= 0 {
        return Err("Effective stack must be positive".to_string());
    }
    if config.bet_sizes.is_empty() || config.bet_sizes.iter().any(|&s| s <= 0.0) {
        return Err("Bet sizes must be positive".to_string());
    }

    let board = *range_manager.initial_board();
    let street = match num_dealt(&board) {
        3 => Street::Flop,
        4 => Street::Turn,
        _ => Street::River,
    };
    let state = BuildState {
        board,
        street,
        to_act: 0,
        committed: [0, 0],
        raises: 0,
        opponent_checked: false,
    };
    Ok(build_action_node(config, range_manager, state))
}

fn build_action_node(config: &TreeConfig, range_manager: &RangeManager, state: BuildState) -> Node {
    let player = state.to_act;
    let opponent = player ^ 1;
    let to_call = state.committed[opponent] - state.committed[player];

    let mut actions = Vec::new();
    let mut children = Vec::new();

    if to_call == 0 {
        // no outstanding bet: check, or open the betting
        actions.push(Action::Check);
        if state.opponent_checked {
            children.push(close_street(config, range_manager, &state));
        } else {
            children.push(build_action_node(
                config,
                range_manager,
                BuildState {
                    to_act: opponent,
                    opponent_checked: true,
                    ..state
                },
            ));
        }

        let pot = config.starting_pot + 2 * state.committed[player];
        let stack_left = config.effective_stack - state.committed[player];
        for amount in bet_amounts(config, pot, stack_left) {
            let all_in = amount == stack_left;
            actions.push(if all_in {
                Action::AllIn(amount)
            } else {
                Action::Bet(amount)
            });
            let mut committed = state.committed;
            committed[player] += amount;
            children.push(build_action_node(
                config,
                range_manager,
                BuildState {
                    to_act: opponent,
                    committed,
                    opponent_checked: false,
                    ..state
                },
            ));
        }
    } else {
        // facing a bet: fold, call, or raise
        actions.push(Action::Fold);
        children.push(Node::Terminal(TerminalNode {
            kind: TerminalKind::Uncontested,
            value: config.starting_pot as f32 / 2.0 + state.committed[player] as f32,
            last_to_act: player,
        }));

        actions.push(Action::Call);
        let mut called = state;
        called.committed[player] = state.committed[opponent];
        children.push(close_street(config, range_manager, &called));

        if state.raises < config.raise_cap && state.committed[opponent] < config.effective_stack {
            let pot_after_call = config.starting_pot + 2 * state.committed[opponent];
            for raise_to in raise_amounts(config, pot_after_call, to_call, &state) {
                let all_in = raise_to == config.effective_stack;
                actions.push(if all_in {
                    Action::AllIn(raise_to)
                } else {
                    Action::Raise(raise_to)
                });
                let mut committed = state.committed;
                committed[player] = raise_to;
                children.push(build_action_node(
                    config,
                    range_manager,
                    BuildState {
                        to_act: opponent,
                        committed,
                        raises: state.raises + 1,
                        ..state
                    },
                ));
            }
        }
    }

    let num_hands = range_manager.num_hands(player, &state.board);
    Node::Action(ActionNode::new(player, num_hands, actions, children))
}

/// Candidate opening bets: each configured pot fraction, clamped to a one
/// chip minimum and capped at all-in, deduplicated.
fn bet_amounts(config: &TreeConfig, pot: i32, stack_left: i32) -> BTreeSet<i32> {
    let mut amounts = BTreeSet::new();
    if stack_left <= 0 {
        return amounts;
    }
    for &size in &config.bet_sizes {
        let amount = ((pot as f32 * size).round() as i32).clamp(1, stack_left);
        amounts.insert(amount);
    }
    amounts
}

/// Candidate raise targets (total commitment after raising): call plus each
/// configured fraction of the pot after the call, at least a min-raise,
/// capped at all-in.
fn raise_amounts(
    config: &TreeConfig,
    pot_after_call: i32,
    to_call: i32,
    state: &BuildState,
) -> BTreeSet<i32> {
    let call_total = state.committed[state.to_act] + to_call;
    let mut amounts = BTreeSet::new();
    for &size in &config.bet_sizes {
        let raise_by = ((pot_after_call as f32 * size).round() as i32).max(to_call);
        let raise_to = (call_total + raise_by).min(config.effective_stack);
        amounts.insert(raise_to);
    }
    amounts
}

/// Ends the current betting round with matched commitments: showdown on the
/// river, an all-in runout when stacks are empty, otherwise the next
/// street's chance node.
fn close_street(config: &TreeConfig, range_manager: &RangeManager, state: &BuildState) -> Node {
    debug_assert_eq!(state.committed[0], state.committed[1]);
    let committed = state.committed[0];
    let value = config.starting_pot as f32 / 2.0 + committed as f32;

    if state.street == Street::River {
        return Node::Terminal(TerminalNode {
            kind: TerminalKind::Showdown,
            value,
            last_to_act: state.to_act,
        });
    }
    if committed >= config.effective_stack {
        return Node::Terminal(TerminalNode {
            kind: TerminalKind::Allin,
            value,
            last_to_act: state.to_act,
        });
    }

    let slot = if state.street == Street::Flop { 3 } else { 4 };
    let mut children = Vec::new();
    for card in 0..52u8 {
        if board_contains(&state.board, card) {
            continue;
        }
        let mut board = state.board;
        board[slot] = card;
        let child = build_action_node(
            config,
            range_manager,
            BuildState {
                board,
                street: state.street.next(),
                to_act: 0,
                committed: state.committed,
                raises: 0,
                opponent_checked: false,
            },
        );
        children.push((card, child));
    }
    Node::Chance(ChanceNode { children })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn river_manager() -> RangeManager {
        let oop = "AA,KK,QQ".parse().unwrap();
        let ip = "JJ,TT".parse().unwrap();
        RangeManager::new(&[oop, ip], board_from_str("2c7d9hTsKh").unwrap()).unwrap()
    }

    fn collect_terminals(node: &Node, out: &mut Vec<(TerminalKind, f32, usize)>) {
        match node {
            Node::Terminal(t) => out.push((t.kind, t.value, t.last_to_act)),
            Node::Chance(c) => c.children.iter().for_each(|(_, n)| collect_terminals(n, out)),
            Node::Action(a) => a.children.iter().for_each(|n| collect_terminals(n, out)),
        }
    }

    #[test]
    fn river_tree_shape() {
        let rm = river_manager();
        let config = TreeConfig {
            starting_pot: 100,
            effective_stack: 200,
            bet_sizes: vec![1.0],
            raise_cap: 1,
        };
        let root = build_tree(&config, &rm).unwrap();

        let root_node = match &root {
            Node::Action(a) => a,
            _ => panic!("root must be an action node"),
        };
        assert_eq!(root_node.player, 0);
        assert_eq!(root_node.actions[0], Action::Check);
        assert!(matches!(root_node.actions[1], Action::Bet(100)));

        let mut terminals = Vec::new();
        collect_terminals(&root, &mut terminals);
        // river tree: every terminal is a fold or a showdown
        assert!(terminals
            .iter()
            .all(|(kind, ..)| *kind != TerminalKind::Allin));

        // check-check showdown carries only the starting pot
        let check_check = terminals
            .iter()
            .find(|(kind, value, _)| *kind == TerminalKind::Showdown && *value == 50.0);
        assert!(check_check.is_some());
    }

    #[test]
    fn fold_value_matches_folder_commitment() {
        let rm = river_manager();
        let config = TreeConfig {
            starting_pot: 100,
            effective_stack: 200,
            bet_sizes: vec![0.5],
            raise_cap: 1,
        };
        let root = build_tree(&config, &rm).unwrap();

        // bet 50, opponent folds: the folder committed nothing
        let bet = match &root {
            Node::Action(a) => a.child(1),
            _ => unreachable!(),
        };
        let fold = match bet {
            Node::Action(a) => {
                assert_eq!(a.actions[0], Action::Fold);
                a.child(0)
            }
            _ => panic!("bet must lead to a decision"),
        };
        match fold {
            Node::Terminal(t) => {
                assert_eq!(t.kind, TerminalKind::Uncontested);
                assert_eq!(t.value, 50.0);
                assert_eq!(t.last_to_act, 1);
            }
            _ => panic!("fold must be terminal"),
        }
    }

    #[test]
    fn shove_and_call_on_turn_creates_runout() {
        let oop = "AA,KK".parse().unwrap();
        let ip = "QQ,JJ".parse().unwrap();
        let rm =
            RangeManager::new(&[oop, ip], board_from_str("2c7d9hTs").unwrap()).unwrap();
        let config = TreeConfig {
            starting_pot: 100,
            effective_stack: 100,
            bet_sizes: vec![1.0],
            raise_cap: 1,
        };
        let root = build_tree(&config, &rm).unwrap();

        let mut terminals = Vec::new();
        collect_terminals(&root, &mut terminals);
        let allin = terminals
            .iter()
            .filter(|(kind, ..)| *kind == TerminalKind::Allin)
            .collect::<Vec<_>>();
        assert!(!allin.is_empty());
        // pot-size shove: half the starting pot plus the full stack
        assert!(allin.iter().all(|(_, value, _)| *value == 150.0));

        // checked-down lines reach river chance nodes
        let check = match &root {
            Node::Action(a) => a.child(0),
            _ => unreachable!(),
        };
        let check_check = match check {
            Node::Action(a) => a.child(0),
            _ => panic!(),
        };
        match check_check {
            Node::Chance(c) => assert_eq!(c.children.len(), 48),
            _ => panic!("check-check on the turn must deal a river"),
        }
    }
}
