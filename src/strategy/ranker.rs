//! Signal ranking and vote-threshold classification.

use crate::config::ThresholdsConfig;
use crate::signals::{MarketSignal, SignalDirection};
use std::collections::HashMap;

/// Classifies signals against the configured vote thresholds and ranks the
/// universe by net score. Holds no state across snapshots.
#[derive(Debug, Clone)]
pub struct SignalRanker {
    strong_buy_votes: u32,
    strong_sell_votes: u32,
    weak_sell_votes: u32,
}

impl SignalRanker {
    pub fn new(thresholds: &ThresholdsConfig) -> Self {
        Self {
            strong_buy_votes: thresholds.strong_buy_votes,
            strong_sell_votes: thresholds.strong_sell_votes,
            weak_sell_votes: thresholds.weak_sell_votes,
        }
    }

    /// Order the snapshot by score descending. Ties break on pair name so
    /// the ranking is deterministic.
    pub fn rank<'a>(
        &self,
        signals: &'a HashMap<String, MarketSignal>,
    ) -> Vec<(&'a str, &'a MarketSignal)> {
        let mut ranked: Vec<(&str, &MarketSignal)> = signals
            .iter()
            .map(|(pair, signal)| (pair.as_str(), signal))
            .collect();
        ranked.sort_by(|a, b| b.1.score().cmp(&a.1.score()).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// Directional sell with enough indicators agreeing to exit outright.
    pub fn is_strong_sell(&self, signal: &MarketSignal) -> bool {
        signal.direction == SignalDirection::Sell && signal.sell_votes >= self.strong_sell_votes
    }

    /// Enough sell votes to be rebalance-funding material; direction is
    /// deliberately ignored here.
    pub fn is_weak_sell(&self, signal: &MarketSignal) -> bool {
        signal.sell_votes >= self.weak_sell_votes
    }

    /// Directional buy with enough indicators agreeing to deploy into.
    pub fn is_strong_buy(&self, signal: &MarketSignal) -> bool {
        signal.direction == SignalDirection::Buy && signal.buy_votes >= self.strong_buy_votes
    }

    /// Strong-buy candidates in rank order.
    pub fn strong_buy_candidates<'a>(
        &self,
        signals: &'a HashMap<String, MarketSignal>,
    ) -> Vec<(&'a str, &'a MarketSignal)> {
        self.rank(signals)
            .into_iter()
            .filter(|(_, signal)| self.is_strong_buy(signal))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn signal(buy: u32, sell: u32, direction: SignalDirection) -> MarketSignal {
        MarketSignal {
            price: dec!(100),
            buy_votes: buy,
            sell_votes: sell,
            neutral_votes: 26u32.saturating_sub(buy + sell),
            direction,
        }
    }

    fn ranker() -> SignalRanker {
        SignalRanker::new(&ThresholdsConfig::default())
    }

    #[test]
    fn test_rank_orders_by_score_descending() {
        let mut signals = HashMap::new();
        signals.insert("A/USD".to_string(), signal(5, 10, SignalDirection::Sell));
        signals.insert("B/USD".to_string(), signal(20, 2, SignalDirection::Buy));
        signals.insert("C/USD".to_string(), signal(10, 5, SignalDirection::Buy));

        let ranked = ranker().rank(&signals);
        let pairs: Vec<&str> = ranked.iter().map(|(p, _)| *p).collect();
        assert_eq!(pairs, vec!["B/USD", "C/USD", "A/USD"]);
    }

    #[test]
    fn test_rank_ties_break_on_pair_name() {
        let mut signals = HashMap::new();
        signals.insert("Z/USD".to_string(), signal(10, 5, SignalDirection::Buy));
        signals.insert("A/USD".to_string(), signal(10, 5, SignalDirection::Buy));

        let ranked = ranker().rank(&signals);
        assert_eq!(ranked[0].0, "A/USD");
    }

    #[test]
    fn test_strong_sell_requires_direction_and_votes() {
        let r = ranker();
        assert!(r.is_strong_sell(&signal(0, 13, SignalDirection::Sell)));
        assert!(!r.is_strong_sell(&signal(0, 12, SignalDirection::Sell)));
        assert!(!r.is_strong_sell(&signal(0, 13, SignalDirection::Neutral)));
    }

    #[test]
    fn test_weak_sell_ignores_direction() {
        let r = ranker();
        assert!(r.is_weak_sell(&signal(0, 8, SignalDirection::Neutral)));
        assert!(r.is_weak_sell(&signal(10, 8, SignalDirection::Buy)));
        assert!(!r.is_weak_sell(&signal(0, 7, SignalDirection::Sell)));
    }

    #[test]
    fn test_strong_buy_candidates_are_ranked() {
        let mut signals = HashMap::new();
        signals.insert("A/USD".to_string(), signal(13, 0, SignalDirection::Buy));
        signals.insert("B/USD".to_string(), signal(20, 0, SignalDirection::Buy));
        signals.insert("C/USD".to_string(), signal(20, 0, SignalDirection::Neutral));
        signals.insert("D/USD".to_string(), signal(12, 0, SignalDirection::Buy));

        let candidates = ranker().strong_buy_candidates(&signals);
        let pairs: Vec<&str> = candidates.iter().map(|(p, _)| *p).collect();
        assert_eq!(pairs, vec!["B/USD", "A/USD"]);
    }
}
