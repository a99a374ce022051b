// Per-session tick processor: order-book snapshot -> cost estimate

use std::time::Instant;
use tracing::warn;

use crate::config::{FeeRates, FeeSchedule};
use crate::core::types::{CostBreakdown, CostEstimate, Session, Tick};
use crate::models::{CostModel, MarketCostModel};

/// Applies the cost models to each tick of one session.
///
/// `process_tick` never blocks and never panics: an invalid tick produces
/// `CostEstimate::Unavailable` without touching the model.
#[derive(Debug, Clone)]
pub struct TickProcessor<M = MarketCostModel> {
    session: Session,
    fee_rates: FeeRates,
    model: M,
}

impl<M: CostModel> TickProcessor<M> {
    pub fn new(session: Session, fees: &FeeSchedule, model: M) -> Self {
        let fee_rates = session.fee_tier.rates(fees);
        Self {
            session,
            fee_rates,
            model,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn fee_rates(&self) -> FeeRates {
        self.fee_rates
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn process_tick(&self, tick: &Tick) -> CostEstimate {
        let (best_bid, best_ask) = match (tick.best_bid(), tick.best_ask()) {
            (Some(bid), Some(ask)) => (bid.price, ask.price),
            _ => {
                warn!(
                    bids = tick.bids.len(),
                    asks = tick.asks.len(),
                    "Invalid tick data received, order book side missing"
                );
                return CostEstimate::Unavailable;
            }
        };

        let started = Instant::now();

        let mid_price = (best_bid + best_ask) / 2.0;
        let quantity = self.session.quantity;
        let volatility = self.session.volatility;

        let slippage = self.model.slippage(quantity, volatility);
        let market_impact = self.model.market_impact(quantity, volatility);
        let split = self.model.maker_taker(volatility);

        let blended_fee_rate = split.maker * self.fee_rates.maker + split.taker * self.fee_rates.taker;
        let fees = quantity * mid_price * blended_fee_rate;
        let net_cost = slippage + market_impact + fees;

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        CostEstimate::Available(CostBreakdown {
            mid_price,
            slippage,
            fees,
            market_impact,
            net_cost,
            maker_probability: split.maker,
            taker_probability: split.taker,
            latency_ms,
        })
    }
}

impl TickProcessor<MarketCostModel> {
    /// Processor with the configured production models
    pub fn with_config(session: Session, config: &crate::config::Config) -> Self {
        Self::new(session, &config.fees, MarketCostModel::from_config(&config.models))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FeeTier, PriceLevel};
    use crate::models::MakerTakerSplit;
    use std::cell::Cell;

    fn session(quantity: f64, volatility: f64, fee_tier: FeeTier) -> Session {
        Session {
            quantity,
            volatility,
            fee_tier,
            instrument: "BTC-USDT".to_string(),
        }
    }

    fn tick(bid: f64, ask: f64) -> Tick {
        Tick::new(vec![PriceLevel::new(bid, 1.0)], vec![PriceLevel::new(ask, 1.0)])
    }

    #[derive(Default)]
    struct CountingModel {
        calls: Cell<u32>,
    }

    impl CostModel for CountingModel {
        fn market_impact(&self, _quantity: f64, _volatility: f64) -> f64 {
            self.calls.set(self.calls.get() + 1);
            0.0
        }

        fn slippage(&self, _quantity: f64, _volatility: f64) -> f64 {
            self.calls.set(self.calls.get() + 1);
            0.0
        }

        fn maker_taker(&self, _volatility: f64) -> MakerTakerSplit {
            self.calls.set(self.calls.get() + 1);
            MakerTakerSplit { maker: 1.0, taker: 0.0 }
        }
    }

    #[test]
    fn golden_scenario() {
        let processor = TickProcessor::new(
            session(100.0, 0.02, FeeTier::Tier1),
            &FeeSchedule::default(),
            MarketCostModel::default(),
        );

        let estimate = processor.process_tick(&tick(100.0, 100.2));
        let b = estimate.breakdown().expect("valid tick must produce an estimate");

        assert!((b.mid_price - 100.1).abs() < 1e-9);
        assert_eq!(b.market_impact, 0.00026);
        assert_eq!(b.slippage, 0.04902);
        assert_eq!(b.maker_probability, 0.9526);
        assert_eq!(b.taker_probability, 0.0474);
        assert!((b.fees - 10.247237).abs() < 1e-6, "fees {}", b.fees);
        assert!((b.net_cost - 10.296517).abs() < 1e-6, "net {}", b.net_cost);
        assert!(b.latency_ms >= 0.0);
    }

    #[test]
    fn tier_2_fees_are_lower() {
        let t1 = TickProcessor::with_config(session(100.0, 0.02, FeeTier::Tier1), &Default::default());
        let t2 = TickProcessor::with_config(session(100.0, 0.02, FeeTier::Tier2), &Default::default());

        let fees_1 = t1.process_tick(&tick(100.0, 100.2)).breakdown().unwrap().fees;
        let fees_2 = t2.process_tick(&tick(100.0, 100.2)).breakdown().unwrap().fees;
        assert!(fees_2 < fees_1);
        assert_eq!(t2.fee_rates(), FeeRates { maker: 0.0008, taker: 0.0012 });
    }

    #[test]
    fn invalid_tick_never_reaches_the_model() {
        let processor = TickProcessor::new(
            session(100.0, 0.02, FeeTier::Tier1),
            &FeeSchedule::default(),
            CountingModel::default(),
        );

        let no_asks = Tick::new(vec![PriceLevel::new(100.0, 1.0)], vec![]);
        let no_bids = Tick::new(vec![], vec![PriceLevel::new(100.2, 1.0)]);

        assert_eq!(processor.process_tick(&no_asks), CostEstimate::Unavailable);
        assert_eq!(processor.process_tick(&no_bids), CostEstimate::Unavailable);
        assert_eq!(processor.process_tick(&Tick::default()), CostEstimate::Unavailable);
        assert_eq!(processor.model().calls.get(), 0);

        processor.process_tick(&tick(100.0, 100.2));
        assert_eq!(processor.model().calls.get(), 3);
    }

    #[test]
    fn only_best_levels_drive_mid_price() {
        let processor = TickProcessor::with_config(session(10.0, 0.0, FeeTier::Tier1), &Default::default());
        let deep = Tick::new(
            vec![PriceLevel::new(50.0, 1.0), PriceLevel::new(10.0, 100.0)],
            vec![PriceLevel::new(52.0, 1.0), PriceLevel::new(900.0, 100.0)],
        );
        assert_eq!(processor.process_tick(&deep).breakdown().unwrap().mid_price, 51.0);
    }
}
