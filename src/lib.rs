//! A heads-up postflop subgame solver.
//!
//! The solver computes approximate Nash-equilibrium strategies by
//! counterfactual regret minimization over a recursive, parallel game-tree
//! walk, and measures solution quality with a best-response exploitability
//! report.
//!
//! # Examples
//! ```
//! use subgame_solver::*;
//!
//! // configure the spot
//! let oop_range = "QQ+,AKs,A5s,KQs,T9s".parse::<Range>().unwrap();
//! let ip_range = "JJ-77,AQs-ATs,KJs,QJs".parse::<Range>().unwrap();
//! let board = board_from_str("Td9d6hQc").unwrap();
//!
//! // build the range data and the betting tree
//! let range_manager = RangeManager::new(&[oop_range, ip_range], board).unwrap();
//! let config = TreeConfig {
//!     starting_pot: 60,
//!     effective_stack: 170,
//!     bet_sizes: vec![0.75],
//!     raise_cap: 1,
//! };
//! let root = build_tree(&config, &range_manager).unwrap();
//!
//! // train and report exploitability every 25 iterations
//! let trainer = Trainer::new(&range_manager, config.starting_pot);
//! let exploitability = trainer.train(&root, 50);
//! assert!(exploitability.is_finite());
//! ```
//!
//! # Implementation details
//! - **Algorithm**: Discounted CFR with simultaneous updates; both seats
//!   are traversed every iteration against the opponent's current strategy.
//! - **Precision**: 32-bit floats everywhere, with 64-bit accumulators in
//!   the showdown summations.
//! - **Parallelism**: every multi-child point of the walk (actions, chance
//!   cards, all-in runouts) fans out on the global rayon pool and joins
//!   before combining.
//!
//! # Crate features
//! - `rayon`: parallelizes the tree walk. Enabled by default; disabling it
//!   makes the walk sequential with identical results.

mod best_response;
mod card;
mod equity;
mod hand;
mod mutex_like;
mod node;
mod range;
mod range_manager;
mod sliceop;
mod solver;
mod tree;
mod utility;
mod walk;

pub use best_response::*;
pub use card::*;
pub use mutex_like::*;
pub use node::*;
pub use range::*;
pub use range_manager::*;
pub use solver::*;
pub use tree::*;
