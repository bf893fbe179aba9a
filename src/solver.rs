use crate::best_response::*;
use crate::node::*;
use crate::range_manager::*;
use crate::sliceop::*;
use crate::walk::*;
use std::io::{stdout, Write};
use std::time::Instant;

/// The CFR instantiation of the tree walk.
///
/// Both players play their current regret-matched strategies. The node
/// whose turn it is additionally accumulates statistics: regrets when it
/// belongs to the hero seat, the weighted strategy sum when it belongs to
/// the villain seat.
pub(crate) struct CfrPass {
    pub iteration: u32,
}

impl TraversalMode for CfrPass {
    fn villain_strategy(&self, node: &ActionNode) -> Vec<f32> {
        node.current_strategy()
    }

    fn combine_hero(&self, node: &ActionNode, action_evs: Vec<Vec<f32>>) -> Vec<f32> {
        let strategy = node.current_strategy();
        let mut combined = vec![0.0; node.num_hands];

        for (action, evs) in action_evs.iter().enumerate() {
            node.update_regrets(evs, action);
            let mut weighted = evs.clone();
            mul_slice(&mut weighted, row(&strategy, action, node.num_hands));
            add_slice(&mut combined, &weighted);
        }

        node.finalize_regrets(&combined, self.iteration);
        combined
    }

    fn villain_visited(&self, node: &ActionNode, strategy: &[f32], villain_reach: &[f32]) {
        node.update_strategy_sum(strategy, villain_reach, self.iteration);
    }
}

/// Drives CFR training over a built game tree.
///
/// # Examples
/// ```
/// use subgame_solver::*;
///
/// let oop = "AA,KK,55,44".parse::<Range>().unwrap();
/// let ip = "QQ,JJ,33,22".parse::<Range>().unwrap();
/// let board = board_from_str("Td9d6hQc8s").unwrap();
/// let range_manager = RangeManager::new(&[oop, ip], board).unwrap();
///
/// let config = TreeConfig {
///     starting_pot: 60,
///     effective_stack: 120,
///     bet_sizes: vec![1.0],
///     raise_cap: 1,
/// };
/// let root = build_tree(&config, &range_manager).unwrap();
///
/// let trainer = Trainer::new(&range_manager, config.starting_pot);
/// let exploitability = trainer.train(&root, 100);
/// assert!(exploitability < 1.0); // percent of the starting pot
/// ```
pub struct Trainer<'a> {
    range_manager: &'a RangeManager,
    initial_pot: i32,
}

impl<'a> Trainer<'a> {
    #[inline]
    pub fn new(range_manager: &'a RangeManager, initial_pot: i32) -> Self {
        Self {
            range_manager,
            initial_pot,
        }
    }

    /// Runs `num_iterations` rounds of CFR, reporting exploitability before
    /// the first iteration and every 25th iteration thereafter. Each round
    /// updates both seats against the opponent's current strategy. Returns
    /// the final exploitability as a percentage of the starting pot.
    pub fn train(&self, root: &Node, num_iterations: u32) -> f32 {
        let best_response = BestResponse::new(self.range_manager, self.initial_pot);
        let mut exploitability = best_response.print_exploitability(root);
        println!();

        let start = Instant::now();
        for iteration in 1..=num_iterations {
            self.cfr(root, 0, iteration);
            self.cfr(root, 1, iteration);

            if iteration % 25 == 0 {
                exploitability = best_response.print_exploitability(root);
                println!(
                    "{} cfr iterations took: {:.3}s\n",
                    iteration,
                    start.elapsed().as_secs_f64()
                );
                stdout().flush().unwrap();
            }
        }

        if num_iterations % 25 != 0 {
            exploitability = best_response.print_exploitability(root);
        }
        exploitability
    }

    /// One CFR pass with the given hero seat; returns hero's EV vector at
    /// the root.
    pub(crate) fn cfr(&self, root: &Node, hero: usize, iteration: u32) -> Vec<f32> {
        let walk = TreeWalk {
            range_manager: self.range_manager,
            hero,
            villain: hero ^ 1,
            mode: CfrPass { iteration },
        };
        walk.run(root)
    }
}
