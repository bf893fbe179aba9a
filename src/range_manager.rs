use crate::card::*;
use crate::hand::*;
use crate::range::*;

/// A single hole-card combo of a player's range, annotated for a specific
/// board.
#[derive(Debug, Clone, Copy)]
pub struct HandEntry {
    pub card1: Card,
    pub card2: Card,
    /// Total order over 7-card strength; meaningful only on complete boards.
    /// Equal rank is an exact tie.
    pub rank: i32,
    /// Range weight, fixed when the manager is built.
    pub probability: f32,
}

#[derive(Debug, Clone, Default)]
struct BoardData {
    hands: Vec<HandEntry>,
    /// Index of each hand in the parent board's list. River boards keep two
    /// variants, selected by which card of the pair came on the turn:
    /// slot 0 when the turn is the lower card of the pair, slot 1 otherwise.
    parent_index: [Vec<u16>; 2],
    /// Index of the identical combo in the opponent's list for the same
    /// board, or `u16::MAX` if the opponent's range does not contain it.
    same_hand_index: Vec<u16>,
}

/// The range service consumed by the tree walk.
///
/// Built once from the two players' starting ranges and the initial board;
/// for the initial board and for every reachable turn/river board it
/// precomputes the filtered hand list (rank-sorted with ties grouped on
/// complete boards), the index map back into the parent board's list, and
/// the cross-index of identical combos in the opponent's list. After
/// construction every method takes `&self`, so any number of concurrent
/// walk calls may read it.
pub struct RangeManager {
    initial_board: Board,
    initial: [BoardData; 2],
    turn: Vec<[BoardData; 2]>,
    river: Vec<[BoardData; 2]>,
}

/// Filters a hand list for a newly revealed card, keeping the parent order
/// and recording each survivor's index in the parent list.
fn filter_hands(parent: &[HandEntry], card: Card) -> (Vec<HandEntry>, Vec<u16>) {
    let mut hands = Vec::with_capacity(parent.len());
    let mut parent_index = Vec::with_capacity(parent.len());
    for (i, &hand) in parent.iter().enumerate() {
        if hand.card1 != card && hand.card2 != card {
            hands.push(hand);
            parent_index.push(i as u16);
        }
    }
    (hands, parent_index)
}

/// Assigns ranks for a complete board and sorts ascending, ties grouped.
/// The permutation is applied to the parent-index vector as well.
fn rank_and_sort(hands: &mut Vec<HandEntry>, parent_index: &mut [u16], board: &Board) {
    for hand in hands.iter_mut() {
        hand.rank = hand_rank(hand.card1, hand.card2, board);
    }
    let mut order: Vec<u16> = (0..hands.len() as u16).collect();
    order.sort_by_key(|&i| hands[i as usize].rank);
    let sorted_hands = order.iter().map(|&i| hands[i as usize]).collect();
    let sorted_parent: Vec<u16> = order.iter().map(|&i| parent_index[i as usize]).collect();
    *hands = sorted_hands;
    parent_index.copy_from_slice(&sorted_parent);
}

/// Builds a lookup from card-pair index to position in the given hand list.
fn position_lookup(hands: &[HandEntry]) -> Vec<u16> {
    let mut lookup = vec![u16::MAX; 52 * 51 / 2];
    for (i, hand) in hands.iter().enumerate() {
        lookup[card_pair_to_index(hand.card1, hand.card2)] = i as u16;
    }
    lookup
}

fn fill_same_hand_indices(data: &mut [BoardData; 2]) {
    for player in 0..2 {
        let opponent_lookup = position_lookup(&data[player ^ 1].hands);
        data[player].same_hand_index = data[player]
            .hands
            .iter()
            .map(|hand| opponent_lookup[card_pair_to_index(hand.card1, hand.card2)])
            .collect();
    }
}

impl RangeManager {
    /// Builds the range data for every board reachable from `initial_board`.
    ///
    /// The initial board must be a 3, 4, or 5 card board; each player's
    /// range must keep at least one combo after removing board conflicts.
    pub fn new(ranges: &[Range; 2], initial_board: Board) -> Result<Self, String> {
        for i in 0..num_dealt(&initial_board) {
            if initial_board[i] >= 52 {
                return Err(format!("Invalid board card: {}", initial_board[i]));
            }
            for j in i + 1..num_dealt(&initial_board) {
                if initial_board[i] == initial_board[j] {
                    return Err("Board cards must be unique".to_string());
                }
            }
        }
        if initial_board[3] == NOT_DEALT && initial_board[4] != NOT_DEALT {
            return Err("River cannot be dealt before the turn".to_string());
        }

        let mut initial: [BoardData; 2] = Default::default();
        for player in 0..2 {
            let mut hands = Vec::new();
            for card1 in 0..52u8 {
                for card2 in card1 + 1..52 {
                    if board_contains(&initial_board, card1)
                        || board_contains(&initial_board, card2)
                    {
                        continue;
                    }
                    let probability = ranges[player].get_weight_by_cards(card1, card2);
                    if probability > 0.0 {
                        hands.push(HandEntry {
                            card1,
                            card2,
                            rank: 0,
                            probability,
                        });
                    }
                }
            }
            if hands.is_empty() {
                return Err(format!(
                    "Range of player {player} has no combo compatible with the board"
                ));
            }
            initial[player].hands = hands;
        }

        let dealt = num_dealt(&initial_board);
        if dealt == 5 {
            for player in 0..2 {
                let mut parent_index = vec![0; initial[player].hands.len()];
                rank_and_sort(
                    &mut initial[player].hands,
                    &mut parent_index,
                    &initial_board,
                );
            }
        }
        fill_same_hand_indices(&mut initial);

        let mut ret = Self {
            initial_board,
            initial,
            turn: vec![Default::default(); 52],
            river: vec![Default::default(); 52 * 51 / 2],
        };

        match dealt {
            3 => ret.build_from_flop(),
            4 => ret.build_from_turn(),
            _ => {}
        }

        Ok(ret)
    }

    fn build_from_flop(&mut self) {
        for turn in 0..52u8 {
            if board_contains(&self.initial_board, turn) {
                continue;
            }
            let mut data: [BoardData; 2] = Default::default();
            for player in 0..2 {
                let (hands, parent_index) = filter_hands(&self.initial[player].hands, turn);
                data[player].hands = hands;
                data[player].parent_index[0] = parent_index;
            }
            fill_same_hand_indices(&mut data);
            self.turn[turn as usize] = data;
        }

        for turn in 0..52u8 {
            if board_contains(&self.initial_board, turn) {
                continue;
            }
            for river in turn + 1..52 {
                if board_contains(&self.initial_board, river) {
                    continue;
                }
                let board = [
                    self.initial_board[0],
                    self.initial_board[1],
                    self.initial_board[2],
                    turn,
                    river,
                ];
                let mut data: [BoardData; 2] = Default::default();
                for player in 0..2 {
                    // descend via the lower card as the turn, then reindex
                    // the other orientation through a position lookup
                    let (mut hands, mut via_low) =
                        filter_hands(&self.turn[turn as usize][player].hands, river);
                    rank_and_sort(&mut hands, &mut via_low, &board);

                    let high_lookup = position_lookup(&self.turn[river as usize][player].hands);
                    let via_high: Vec<u16> = hands
                        .iter()
                        .map(|h| high_lookup[card_pair_to_index(h.card1, h.card2)])
                        .collect();

                    data[player].hands = hands;
                    data[player].parent_index = [via_low, via_high];
                }
                fill_same_hand_indices(&mut data);
                self.river[card_pair_to_index(turn, river)] = data;
            }
        }
    }

    fn build_from_turn(&mut self) {
        let turn = self.initial_board[3];
        for river in 0..52u8 {
            if board_contains(&self.initial_board, river) {
                continue;
            }
            let mut board = self.initial_board;
            board[4] = river;
            let mut data: [BoardData; 2] = Default::default();
            for player in 0..2 {
                let (mut hands, mut parent_index) =
                    filter_hands(&self.initial[player].hands, river);
                rank_and_sort(&mut hands, &mut parent_index, &board);
                let slot = (turn > river) as usize;
                data[player].hands = hands;
                data[player].parent_index[slot] = parent_index;
            }
            fill_same_hand_indices(&mut data);
            self.river[card_pair_to_index(turn, river)] = data;
        }
    }

    #[inline]
    fn data(&self, player: usize, board: &Board) -> &BoardData {
        let dealt = num_dealt(board);
        if dealt == num_dealt(&self.initial_board) {
            &self.initial[player]
        } else if dealt == 5 {
            &self.river[card_pair_to_index(board[3], board[4])][player]
        } else {
            &self.turn[board[3] as usize][player]
        }
    }

    /// Returns the initial board this manager was built for.
    #[inline]
    pub fn initial_board(&self) -> &Board {
        &self.initial_board
    }

    /// Returns the hand list for the initial board.
    #[inline]
    pub fn starting_hands(&self, player: usize) -> &[HandEntry] {
        &self.initial[player].hands
    }

    /// Returns the hand list for the given board.
    ///
    /// Lists for complete boards are sorted ascending by rank with ties
    /// grouped contiguously.
    #[inline]
    pub fn hands(&self, player: usize, board: &Board) -> &[HandEntry] {
        &self.data(player, board).hands
    }

    /// Returns the number of hands for the given board.
    #[inline]
    pub fn num_hands(&self, player: usize, board: &Board) -> usize {
        self.data(player, board).hands.len()
    }

    /// Returns the reach probabilities of the initial board's hand list,
    /// i.e. the raw range weights.
    #[inline]
    pub fn initial_reach_probs(&self, player: usize) -> Vec<f32> {
        self.initial[player]
            .hands
            .iter()
            .map(|hand| hand.probability)
            .collect()
    }

    /// Maps each hand index of a post-reveal board to the index of the same
    /// combo in the parent board's list. Used to scatter child results back
    /// into the parent's index space.
    #[inline]
    pub fn index_map(&self, player: usize, board: &Board) -> &[u16] {
        let slot = (num_dealt(board) == 5 && board[3] > board[4]) as usize;
        &self.data(player, board).parent_index[slot]
    }

    /// Returns, for each hand index, the index of the identical combo in the
    /// opponent's list at the same board (`u16::MAX` if absent).
    #[inline]
    pub fn same_hand_index(&self, player: usize, board: &Board) -> &[u16] {
        &self.data(player, board).same_hand_index
    }

    /// Filters a reach-probability vector across a card reveal: the result
    /// is aligned to `new_board`'s hand list, pulling each surviving combo's
    /// probability from `old_probs` (aligned to the parent board's list).
    pub fn reach_probs(&self, player: usize, new_board: &Board, old_probs: &[f32]) -> Vec<f32> {
        self.index_map(player, new_board)
            .iter()
            .map(|&i| old_probs[i as usize])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(board: &str) -> RangeManager {
        let oop = "QQ+,AKs,A5s,T9s".parse().unwrap();
        let ip = "JJ+,AQs+,KQo".parse().unwrap();
        RangeManager::new(&[oop, ip], board_from_str(board).unwrap()).unwrap()
    }

    #[test]
    fn board_conflicts_are_removed() {
        let rm = manager("QsJs2h");
        // QQ loses the combos containing the Qs
        let starting = rm.starting_hands(0);
        assert!(starting
            .iter()
            .all(|h| h.card1 != card_from_str("Qs").unwrap()
                && h.card2 != card_from_str("Qs").unwrap()));
        // only three QQ combos survive the Qs
        let qq = starting
            .iter()
            .filter(|h| h.card1 >> 2 == 10 && h.card2 >> 2 == 10)
            .count();
        assert_eq!(qq, 3);
    }

    #[test]
    fn reveal_filters_and_remaps() {
        let rm = manager("QsJs2h");
        let board = board_from_str("QsJs2h").unwrap();
        let mut turn_board = board;
        turn_board[3] = card_from_str("Ah").unwrap();

        let parent = rm.hands(0, &board);
        let child = rm.hands(0, &turn_board);
        assert!(child.len() < parent.len());

        let map = rm.index_map(0, &turn_board);
        assert_eq!(map.len(), child.len());
        for (k, hand) in child.iter().enumerate() {
            let p = parent[map[k] as usize];
            assert_eq!((p.card1, p.card2), (hand.card1, hand.card2));
        }

        // filtered reach probs carry over each surviving combo's weight
        let probs = rm.reach_probs(0, &turn_board, &rm.initial_reach_probs(0));
        for (k, hand) in child.iter().enumerate() {
            assert_eq!(probs[k], hand.probability);
        }
    }

    #[test]
    fn river_lists_are_rank_sorted() {
        let rm = manager("QsJs2h");
        let board = board_from_str("QsJs2h8dAc").unwrap();
        for player in 0..2 {
            let hands = rm.hands(player, &board);
            assert!(!hands.is_empty());
            for w in hands.windows(2) {
                assert!(w[0].rank <= w[1].rank);
            }
        }
    }

    #[test]
    fn both_turn_orientations_agree() {
        let rm = manager("QsJs2h");
        let flop = board_from_str("QsJs2h").unwrap();
        let t = card_from_str("8d").unwrap();
        let r = card_from_str("Ac").unwrap();

        let initial = rm.initial_reach_probs(1);

        let mut board_t = flop;
        board_t[3] = t;
        let probs_t = rm.reach_probs(1, &board_t, &initial);
        let mut board_tr = board_t;
        board_tr[4] = r;
        let via_t = rm.reach_probs(1, &board_tr, &probs_t);

        let mut board_r = flop;
        board_r[3] = r;
        let probs_r = rm.reach_probs(1, &board_r, &initial);
        let mut board_rt = board_r;
        board_rt[4] = t;
        let via_r = rm.reach_probs(1, &board_rt, &probs_r);

        assert_eq!(via_t, via_r);
    }

    #[test]
    fn same_hand_index_is_symmetric() {
        let rm = manager("QsJs2h");
        let board = board_from_str("QsJs2h").unwrap();
        let oop = rm.hands(0, &board);
        let ip = rm.hands(1, &board);
        let same = rm.same_hand_index(0, &board);
        for (i, &j) in same.iter().enumerate() {
            if j != u16::MAX {
                let a = oop[i];
                let b = ip[j as usize];
                assert_eq!((a.card1, a.card2), (b.card1, b.card2));
            }
        }
        // identical ranges map onto themselves
        let range: Range = "QQ+,AKs".parse().unwrap();
        let rm2 = RangeManager::new(
            &[range.clone(), range],
            board_from_str("2c3d4h").unwrap(),
        )
        .unwrap();
        let board2 = board_from_str("2c3d4h").unwrap();
        let same2 = rm2.same_hand_index(0, &board2);
        for (i, &j) in same2.iter().enumerate() {
            assert_eq!(i as u16, j);
        }
    }
}
