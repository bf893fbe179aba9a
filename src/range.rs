use crate::card::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

/// A struct representing a player's starting range.
///
/// The [`Range`] struct implements the [`FromStr`] trait, so a range can be
/// constructed from a string with `parse::<Range>()`. The grammar:
///
/// - Groups are separated by commas (e.g., `"AA,AKs"`).
/// - A group can carry an optional weight after a colon (e.g., `"AA:0.5"`).
/// - Each group is a singleton (`"AA"`, `"AKs"`, `"AKo"`, `"AsKh"`), a plus
///   range (`"TT+"`, `"ATs+"`), or a dash range (`"QQ-88"`, `"A9s-A6s"`).
///
/// # Examples
/// ```
/// use subgame_solver::{card_from_str, Range};
///
/// let range = "QQ+,AKs:0.5".parse::<Range>().unwrap();
/// let qc = card_from_str("Qc").unwrap();
/// let qh = card_from_str("Qh").unwrap();
/// let ac = card_from_str("Ac").unwrap();
/// let kc = card_from_str("Kc").unwrap();
/// assert_eq!(range.get_weight_by_cards(qc, qh), 1.0);
/// assert_eq!(range.get_weight_by_cards(ac, kc), 0.5);
/// ```
#[derive(Clone)]
pub struct Range {
    data: [f32; 52 * 51 / 2],
}

impl Default for Range {
    #[inline]
    fn default() -> Self {
        Self {
            data: [0.0; 52 * 51 / 2],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Suitedness {
    Suited,
    Offsuit,
    All,
    Specific(u8, u8),
}

const COMBO_PAT: &str = r"(?:(?:[AaKkQqJjTt2-9]{2}[os]?)|(?:(?:[AaKkQqJjTt2-9][cdhs]){2}))";
const WEIGHT_PAT: &str = r"(?:(?:[01](\.\d*)?)|(?:\.\d+))";

static RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<range>{COMBO_PAT}(?:\+|(?:-{COMBO_PAT}))?)(?::(?P<weight>{WEIGHT_PAT}))?$"
    ))
    .unwrap()
});

static TRIM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([-:,])\s*").unwrap());

#[inline]
fn pair_indices(rank: u8) -> Vec<usize> {
    let mut result = Vec::with_capacity(6);
    for i in 0..4 {
        for j in i + 1..4 {
            result.push(card_pair_to_index(4 * rank + i, 4 * rank + j));
        }
    }
    result
}

#[inline]
fn nonpair_indices(rank1: u8, rank2: u8) -> Vec<usize> {
    let mut result = Vec::with_capacity(16);
    for i in 0..4 {
        for j in 0..4 {
            result.push(card_pair_to_index(4 * rank1 + i, 4 * rank2 + j));
        }
    }
    result
}

#[inline]
fn suited_indices(rank1: u8, rank2: u8) -> Vec<usize> {
    let mut result = Vec::with_capacity(4);
    for i in 0..4 {
        result.push(card_pair_to_index(4 * rank1 + i, 4 * rank2 + i));
    }
    result
}

#[inline]
fn offsuit_indices(rank1: u8, rank2: u8) -> Vec<usize> {
    let mut result = Vec::with_capacity(12);
    for i in 0..4 {
        for j in 0..4 {
            if i != j {
                result.push(card_pair_to_index(4 * rank1 + i, 4 * rank2 + j));
            }
        }
    }
    result
}

fn indices_with_suitedness(rank1: u8, rank2: u8, suitedness: Suitedness) -> Result<Vec<usize>, String> {
    if rank1 == rank2 {
        match suitedness {
            Suitedness::All => Ok(pair_indices(rank1)),
            Suitedness::Specific(suit1, suit2) => {
                Ok(vec![card_pair_to_index(4 * rank1 + suit1, 4 * rank1 + suit2)])
            }
            _ => Err("A pair cannot be suited or offsuit".to_string()),
        }
    } else {
        match suitedness {
            Suitedness::Suited => Ok(suited_indices(rank1, rank2)),
            Suitedness::Offsuit => Ok(offsuit_indices(rank1, rank2)),
            Suitedness::All => Ok(nonpair_indices(rank1, rank2)),
            Suitedness::Specific(suit1, suit2) => {
                Ok(vec![card_pair_to_index(4 * rank1 + suit1, 4 * rank2 + suit2)])
            }
        }
    }
}

/// Parses a single combo token into `(high rank, low rank, suitedness)`.
fn parse_combo(combo: &str) -> Result<(u8, u8, Suitedness), String> {
    let chars: Vec<char> = combo.chars().collect();
    match chars.len() {
        2 | 3 => {
            let mut rank1 = char_to_rank(chars[0])?;
            let mut rank2 = char_to_rank(chars[1])?;
            if rank1 < rank2 {
                std::mem::swap(&mut rank1, &mut rank2);
            }
            let suitedness = match chars.get(2) {
                None => Suitedness::All,
                Some('s') => Suitedness::Suited,
                Some('o') => Suitedness::Offsuit,
                Some(c) => return Err(format!("Invalid suitedness: {c}")),
            };
            if rank1 == rank2 && suitedness != Suitedness::All {
                return Err(format!("A pair cannot be suited or offsuit: {combo}"));
            }
            Ok((rank1, rank2, suitedness))
        }
        4 => {
            let mut rank1 = char_to_rank(chars[0])?;
            let mut suit1 = char_to_suit(chars[1])?;
            let mut rank2 = char_to_rank(chars[2])?;
            let mut suit2 = char_to_suit(chars[3])?;
            if rank1 == rank2 && suit1 == suit2 {
                return Err(format!("Duplicate cards: {combo}"));
            }
            if rank1 < rank2 {
                std::mem::swap(&mut rank1, &mut rank2);
                std::mem::swap(&mut suit1, &mut suit2);
            }
            Ok((rank1, rank2, Suitedness::Specific(suit1, suit2)))
        }
        _ => Err(format!("Failed to parse combo: {combo}")),
    }
}

impl Range {
    /// Returns the weight of the given card pair.
    #[inline]
    pub fn get_weight_by_cards(&self, card1: Card, card2: Card) -> f32 {
        self.data[card_pair_to_index(card1, card2)]
    }

    /// Returns whether the range has no combo with a positive weight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|&w| w == 0.0)
    }

    fn set_weight(&mut self, indices: &[usize], weight: f32) {
        for &index in indices {
            self.data[index] = weight;
        }
    }

    fn update_with_singleton(&mut self, combo: &str, weight: f32) -> Result<(), String> {
        let (rank1, rank2, suitedness) = parse_combo(combo)?;
        self.set_weight(&indices_with_suitedness(rank1, rank2, suitedness)?, weight);
        Ok(())
    }

    fn update_with_plus_range(&mut self, range: &str, weight: f32) -> Result<(), String> {
        let combo = &range[..range.len() - 1];
        let (rank1, rank2, suitedness) = parse_combo(combo)?;
        if matches!(suitedness, Suitedness::Specific(..)) {
            return Err(format!("A plus range cannot use specific suits: {range}"));
        }
        let gap = rank1 - rank2;
        if gap <= 1 {
            // pair or connector: step both ranks upward (e.g., "88+", "T9s+")
            for rank in rank1..13 {
                self.set_weight(&indices_with_suitedness(rank, rank - gap, suitedness)?, weight);
            }
        } else {
            // otherwise: fixed high card, kicker upward (e.g., "ATs+")
            for rank in rank2..rank1 {
                self.set_weight(&indices_with_suitedness(rank1, rank, suitedness)?, weight);
            }
        }
        Ok(())
    }

    fn update_with_dash_range(&mut self, range: &str, weight: f32) -> Result<(), String> {
        let (top, bottom) = range.split_once('-').unwrap();
        let (rank11, rank12, suitedness1) = parse_combo(top)?;
        let (rank21, rank22, suitedness2) = parse_combo(bottom)?;
        if suitedness1 != suitedness2 {
            return Err(format!("Both ends must have the same suitedness: {range}"));
        }
        if matches!(suitedness1, Suitedness::Specific(..)) {
            return Err(format!("A dash range cannot use specific suits: {range}"));
        }
        let gap1 = rank11 - rank12;
        let gap2 = rank21 - rank22;
        if gap1 == gap2 && rank21 < rank11 {
            // same gap: step both ranks (e.g., "QQ-88", "98o-65o")
            for rank in rank21..=rank11 {
                self.set_weight(&indices_with_suitedness(rank, rank - gap1, suitedness1)?, weight);
            }
            Ok(())
        } else if rank11 == rank21 && rank22 < rank12 {
            // same high card: kicker downward (e.g., "A9s-A6s")
            for rank in rank22..=rank12 {
                self.set_weight(&indices_with_suitedness(rank11, rank, suitedness1)?, weight);
            }
            Ok(())
        } else {
            Err(format!("Invalid dash range: {range}"))
        }
    }
}

impl FromStr for Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = TRIM_REGEX.replace_all(s.trim(), "$1").to_string();
        let mut ret = Range::default();

        for token in s.split(',') {
            if token.is_empty() {
                continue;
            }
            let caps = RANGE_REGEX
                .captures(token)
                .ok_or_else(|| format!("Failed to parse range: {token}"))?;

            let range = caps.name("range").unwrap().as_str();
            let weight = caps
                .name("weight")
                .map_or(Ok(1.0), |s| s.as_str().parse::<f32>().map_err(|e| e.to_string()))?;
            if !(0.0..=1.0).contains(&weight) {
                return Err(format!("Invalid weight: {weight}"));
            }

            if range.ends_with('+') {
                ret.update_with_plus_range(range, weight)?;
            } else if range.contains('-') {
                ret.update_with_dash_range(range, weight)?;
            } else {
                ret.update_with_singleton(range, weight)?;
            }
        }

        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight(range: &Range, combo: &str) -> f32 {
        let c1 = card_from_str(&combo[0..2]).unwrap();
        let c2 = card_from_str(&combo[2..4]).unwrap();
        range.get_weight_by_cards(c1, c2)
    }

    #[test]
    fn singletons() {
        let range = "AA,KQs,JTo,5h5c".parse::<Range>().unwrap();
        assert_eq!(weight(&range, "AcAd"), 1.0);
        assert_eq!(weight(&range, "KcQc"), 1.0);
        assert_eq!(weight(&range, "KcQd"), 0.0);
        assert_eq!(weight(&range, "JcTd"), 1.0);
        assert_eq!(weight(&range, "JcTc"), 0.0);
        assert_eq!(weight(&range, "5h5c"), 1.0);
        assert_eq!(weight(&range, "5h5d"), 0.0);
    }

    #[test]
    fn weights_and_whitespace() {
        let range = " AA : 0.25 , KK ".parse::<Range>().unwrap();
        assert_eq!(weight(&range, "AhAs"), 0.25);
        assert_eq!(weight(&range, "KhKs"), 1.0);
        assert!(!range.is_empty());
        assert!(Range::default().is_empty());
    }

    #[test]
    fn plus_ranges() {
        let range = "QQ+,ATs+,T9o+".parse::<Range>().unwrap();
        assert_eq!(weight(&range, "AcAd"), 1.0);
        assert_eq!(weight(&range, "QcQd"), 1.0);
        assert_eq!(weight(&range, "JcJd"), 0.0);
        assert_eq!(weight(&range, "AcTc"), 1.0);
        assert_eq!(weight(&range, "AcKc"), 1.0);
        assert_eq!(weight(&range, "Ac9c"), 0.0);
        assert_eq!(weight(&range, "JcTd"), 1.0);
        assert_eq!(weight(&range, "Tc9d"), 1.0);
        assert_eq!(weight(&range, "9c8d"), 0.0);
    }

    #[test]
    fn dash_ranges() {
        let range = "QQ-88,A9s-A6s".parse::<Range>().unwrap();
        assert_eq!(weight(&range, "QcQd"), 1.0);
        assert_eq!(weight(&range, "8c8d"), 1.0);
        assert_eq!(weight(&range, "7c7d"), 0.0);
        assert_eq!(weight(&range, "KcKd"), 0.0);
        assert_eq!(weight(&range, "Ac9c"), 1.0);
        assert_eq!(weight(&range, "Ac6c"), 1.0);
        assert_eq!(weight(&range, "Ac5c"), 0.0);
        assert_eq!(weight(&range, "AcTc"), 0.0);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("AA+KK".parse::<Range>().is_err());
        assert!("AAs".parse::<Range>().is_err());
        assert!("A9s-KK".parse::<Range>().is_err());
        assert!("AA:1.5".parse::<Range>().is_err());
        assert!("AhAh".parse::<Range>().is_err());
    }
}
