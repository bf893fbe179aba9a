extern crate subgame_solver;
use subgame_solver::*;

fn river_setup() -> (RangeManager, Node, i32) {
    let oop = "AA,QQ,99,66,33".parse::<Range>().unwrap();
    let ip = "KK,JJ,88,55,22".parse::<Range>().unwrap();
    let board = board_from_str("Ts7h4c2d9s").unwrap();
    let range_manager = RangeManager::new(&[oop, ip], board).unwrap();

    let config = TreeConfig {
        starting_pot: 100,
        effective_stack: 300,
        bet_sizes: vec![1.0],
        raise_cap: 2,
    };
    let root = build_tree(&config, &range_manager).unwrap();
    (range_manager, root, config.starting_pot)
}

#[test]
fn exploitability_converges_toward_zero() {
    let (range_manager, root, pot) = river_setup();
    let best_response = BestResponse::new(&range_manager, pot);

    let (_, _, initial) = best_response.exploitability(&root);
    assert!(initial > 0.0);

    let trainer = Trainer::new(&range_manager, pot);
    let after_50 = trainer.train(&root, 50);
    let after_250 = trainer.train(&root, 200);

    assert!(after_50 < initial);
    assert!(after_250 <= after_50 + 0.05);
    assert!(after_250 < 1.0, "exploitability still {after_250}%");
    assert!(after_250 > -0.05);
}

#[test]
fn average_profile_conserves_chips() {
    let (range_manager, root, pot) = river_setup();
    let trainer = Trainer::new(&range_manager, pot);
    trainer.train(&root, 100);

    let best_response = BestResponse::new(&range_manager, pot);
    let oop_ev = best_response.average_strategy_ev(&root, 0);
    let ip_ev = best_response.average_strategy_ev(&root, 1);
    assert!(
        (oop_ev + ip_ev).abs() < 0.05,
        "profile EVs do not cancel: {oop_ev} + {ip_ev}"
    );
}

#[test]
fn best_response_dominates_the_average_strategy() {
    let (range_manager, root, pot) = river_setup();
    let trainer = Trainer::new(&range_manager, pot);
    trainer.train(&root, 50);

    let best_response = BestResponse::new(&range_manager, pot);
    for player in 0..2 {
        let br_ev = best_response.best_response_ev(&root, player);
        let avg_ev = best_response.average_strategy_ev(&root, player);
        assert!(
            br_ev >= avg_ev - 1e-3,
            "player {player}: best response {br_ev} below fixed strategy {avg_ev}"
        );
    }
}
