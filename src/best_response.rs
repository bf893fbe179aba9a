use crate::node::*;
use crate::range_manager::*;
use crate::sliceop::*;
use crate::walk::*;

/// The best-response instantiation of the tree walk: hero plays a myopic
/// per-hand best response while the villain plays their average strategy.
pub(crate) struct BestResponsePass;

impl TraversalMode for BestResponsePass {
    fn villain_strategy(&self, node: &ActionNode) -> Vec<f32> {
        node.average_strategy()
    }

    fn combine_hero(&self, node: &ActionNode, action_evs: Vec<Vec<f32>>) -> Vec<f32> {
        let mut best = vec![f32::NEG_INFINITY; node.num_hands];
        for evs in &action_evs {
            max_slice(&mut best, evs);
        }
        best
    }
}

/// A pass where both players follow their average strategies; used to
/// measure the EV of the strategy profile itself.
pub(crate) struct AverageStrategyPass;

impl TraversalMode for AverageStrategyPass {
    fn villain_strategy(&self, node: &ActionNode) -> Vec<f32> {
        node.average_strategy()
    }

    fn combine_hero(&self, node: &ActionNode, action_evs: Vec<Vec<f32>>) -> Vec<f32> {
        let strategy = node.average_strategy();
        let mut combined = vec![0.0; node.num_hands];
        for (action, evs) in action_evs.iter().enumerate() {
            let mut weighted = evs.clone();
            mul_slice(&mut weighted, row(&strategy, action, node.num_hands));
            add_slice(&mut combined, &weighted);
        }
        combined
    }
}

/// Measures how far the trained average strategies are from equilibrium.
///
/// Per-hand EV vectors coming out of the walk are weighted by villain
/// reach probabilities, so aggregating a seat's total EV divides each
/// hand's EV by the villain combo mass it does not block and weights it by
/// the hand's relative probability of being dealt.
pub struct BestResponse<'a> {
    range_manager: &'a RangeManager,
    initial_pot: i32,
    relative_probs: [Vec<f32>; 2],
}

#[inline]
fn cards_overlap(a: &HandEntry, b: &HandEntry) -> bool {
    a.card1 == b.card1 || a.card1 == b.card2 || a.card2 == b.card1 || a.card2 == b.card2
}

/// Total probability of villain combos not blocked by the given hand.
fn unblocked_combo_mass(hand: &HandEntry, villain_hands: &[HandEntry]) -> f32 {
    villain_hands
        .iter()
        .filter(|villain| !cards_overlap(hand, villain))
        .map(|villain| villain.probability)
        .sum()
}

impl<'a> BestResponse<'a> {
    pub fn new(range_manager: &'a RangeManager, initial_pot: i32) -> Self {
        let mut relative_probs: [Vec<f32>; 2] = Default::default();
        for player in 0..2 {
            let hands = range_manager.starting_hands(player);
            let villain_hands = range_manager.starting_hands(player ^ 1);

            let mut probs: Vec<f32> = hands
                .iter()
                .map(|hand| unblocked_combo_mass(hand, villain_hands) * hand.probability)
                .collect();
            let total: f32 = probs.iter().sum();
            probs.iter_mut().for_each(|p| *p /= total);
            relative_probs[player] = probs;
        }

        Self {
            range_manager,
            initial_pot,
            relative_probs,
        }
    }

    /// Hero's total EV when playing a best response against the villain's
    /// average strategy.
    pub fn best_response_ev(&self, root: &Node, hero: usize) -> f32 {
        let walk = TreeWalk {
            range_manager: self.range_manager,
            hero,
            villain: hero ^ 1,
            mode: BestResponsePass,
        };
        self.aggregate(walk.run(root), hero)
    }

    /// Hero's total EV when both players follow their average strategies.
    pub fn average_strategy_ev(&self, root: &Node, hero: usize) -> f32 {
        let walk = TreeWalk {
            range_manager: self.range_manager,
            hero,
            villain: hero ^ 1,
            mode: AverageStrategyPass,
        };
        self.aggregate(walk.run(root), hero)
    }

    fn aggregate(&self, evs: Vec<f32>, hero: usize) -> f32 {
        let hands = self.range_manager.starting_hands(hero);
        let villain_hands = self.range_manager.starting_hands(hero ^ 1);
        evs.iter()
            .enumerate()
            .map(|(i, ev)| {
                ev / unblocked_combo_mass(&hands[i], villain_hands)
                    * self.relative_probs[hero][i]
            })
            .sum()
    }

    /// Computes `(oop_ev, ip_ev, exploitability)`, the exploitability being
    /// the seat-averaged best-response gain as a percentage of the starting
    /// pot.
    pub fn exploitability(&self, root: &Node) -> (f32, f32, f32) {
        let oop_ev = self.best_response_ev(root, 0);
        let ip_ev = self.best_response_ev(root, 1);
        let exploitability = (oop_ev + ip_ev) / 2.0 / self.initial_pot as f32 * 100.0;
        (oop_ev, ip_ev, exploitability)
    }

    /// Prints the exploitability report and returns the percentage.
    pub fn print_exploitability(&self, root: &Node) -> f32 {
        let (oop_ev, ip_ev, exploitability) = self.exploitability(root);
        println!("OOP best response EV: {oop_ev}");
        println!("IP best response EV: {ip_ev}");
        println!("Exploitability: {exploitability}%");
        exploitability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::*;
    use crate::range::Range;
    use crate::walk::TreeWalk;

    /// A hero-to-act node whose children are two fixed fold terminals must
    /// combine to the element-wise maximum under the best-response pass.
    #[test]
    fn best_response_takes_elementwise_max() {
        let oop: Range = "AA,KK".parse().unwrap();
        let ip: Range = "QQ,JJ".parse().unwrap();
        let board = board_from_str("2c7d9hTsAs").unwrap();
        let rm = RangeManager::new(&[oop, ip], board).unwrap();

        let fold_win = Node::Terminal(TerminalNode {
            kind: TerminalKind::Uncontested,
            value: 30.0,
            last_to_act: 1,
        });
        let fold_lose = Node::Terminal(TerminalNode {
            kind: TerminalKind::Uncontested,
            value: 50.0,
            last_to_act: 0,
        });
        let num_hands = rm.num_hands(0, &board);
        let root = Node::Action(ActionNode::new(
            0,
            num_hands,
            vec![crate::tree::Action::Check, crate::tree::Action::Fold],
            vec![fold_win, fold_lose],
        ));

        let walk = TreeWalk {
            range_manager: &rm,
            hero: 0,
            villain: 1,
            mode: BestResponsePass,
        };
        let best = walk.run(&root);

        let child_walk = |child: usize| {
            let walk = TreeWalk {
                range_manager: &rm,
                hero: 0,
                villain: 1,
                mode: BestResponsePass,
            };
            match &root {
                Node::Action(a) => {
                    let reach = rm.initial_reach_probs(1);
                    walk.walk(a.child(child), &reach, &board)
                }
                _ => unreachable!(),
            }
        };
        let first = child_walk(0);
        let second = child_walk(1);
        for h in 0..num_hands {
            assert_eq!(best[h], first[h].max(second[h]));
            // dominance: the best response is at least every single action
            assert!(best[h] >= first[h] && best[h] >= second[h]);
        }
    }
}
