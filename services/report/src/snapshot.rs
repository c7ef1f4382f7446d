//! Report aggregates
//!
//! Computed from a single scan so every section describes the same
//! population. All orderings are total, so equal inputs render identically.

use fix_types::record::StoredRecord;
use fix_types::tags::{SIDE_BUY, SIDE_SELL};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::warn;

pub const TOP_SYMBOL_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolVolume {
    pub symbol: String,
    /// Sum of order quantities over contributing records
    pub volume: Decimal,
    /// Mean price over the same records, rounded half-up to 2 places
    pub avg_price: Decimal,
}

/// Side counts. `absent` has no side tag at all; `other` carries a value
/// that is neither buy nor sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideBreakdown {
    pub total: u64,
    pub buy: u64,
    pub sell: u64,
    pub absent: u64,
    pub other: u64,
}

impl SideBreakdown {
    /// Everything that is not buy or sell.
    pub fn missing(&self) -> u64 {
        self.total - self.buy - self.sell
    }

    pub fn buy_pct(&self) -> Decimal {
        percent(self.buy, self.total)
    }

    pub fn sell_pct(&self) -> Decimal {
        percent(self.sell, self.total)
    }

    pub fn missing_pct(&self) -> Decimal {
        percent(self.missing(), self.total)
    }
}

fn percent(part: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(total)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTypeCount {
    pub msg_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSnapshot {
    pub total: u64,
    pub unique_symbols: u64,
    pub top_symbols: Vec<SymbolVolume>,
    pub sides: SideBreakdown,
    pub message_types: Vec<MessageTypeCount>,
}

#[derive(Default)]
struct SymbolAccumulator {
    volume: Decimal,
    price_sum: Decimal,
    contributors: u64,
}

fn parse_decimal(value: Option<&str>) -> Option<Decimal> {
    Decimal::from_str(value?.trim()).ok()
}

impl ReportSnapshot {
    pub fn compute(records: &[StoredRecord]) -> Self {
        let mut symbols: BTreeSet<&str> = BTreeSet::new();
        let mut volumes: BTreeMap<&str, SymbolAccumulator> = BTreeMap::new();
        let mut msg_types: BTreeMap<&str, u64> = BTreeMap::new();
        let mut sides = SideBreakdown {
            total: records.len() as u64,
            ..Default::default()
        };

        for record in records {
            if let Some(symbol) = record.symbol.as_deref() {
                symbols.insert(symbol);

                let qty = parse_decimal(record.order_qty.as_deref());
                let price = parse_decimal(record.price.as_deref());
                if let (Some(qty), Some(price)) = (qty, price) {
                    let acc = volumes.entry(symbol).or_default();
                    match (acc.volume.checked_add(qty), acc.price_sum.checked_add(price)) {
                        (Some(volume), Some(price_sum)) => {
                            acc.volume = volume;
                            acc.price_sum = price_sum;
                            acc.contributors += 1;
                        }
                        // Out of Decimal range: left out like an unparseable value
                        _ => warn!(
                            id = %record.stream_id,
                            symbol,
                            "Quantity or price overflows symbol totals, excluded"
                        ),
                    }
                }
            }

            match record.side.as_deref() {
                Some(SIDE_BUY) => sides.buy += 1,
                Some(SIDE_SELL) => sides.sell += 1,
                Some(_) => sides.other += 1,
                None => sides.absent += 1,
            }

            if let Some(msg_type) = record.msg_type.as_deref() {
                *msg_types.entry(msg_type).or_default() += 1;
            }
        }

        let mut top_symbols: Vec<SymbolVolume> = volumes
            .into_iter()
            .filter(|(_, acc)| acc.volume > Decimal::ZERO)
            .map(|(symbol, acc)| SymbolVolume {
                symbol: symbol.to_string(),
                volume: acc.volume,
                avg_price: (acc.price_sum / Decimal::from(acc.contributors))
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            })
            .collect();
        // BTreeMap iteration already yields symbols ascending; the stable
        // sort keeps that order among equal volumes.
        top_symbols.sort_by(|a, b| b.volume.cmp(&a.volume));
        top_symbols.truncate(TOP_SYMBOL_LIMIT);

        let mut message_types: Vec<MessageTypeCount> = msg_types
            .into_iter()
            .map(|(msg_type, count)| MessageTypeCount {
                msg_type: msg_type.to_string(),
                count,
            })
            .collect();
        message_types.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total: sides.total,
            unique_symbols: symbols.len() as u64,
            top_symbols,
            sides,
            message_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fix_types::ids::StreamEntryId;
    use fix_types::record::{FieldMap, RawRecord};
    use proptest::prelude::*;

    fn record(pairs: &[(&str, &str)]) -> StoredRecord {
        let fields: FieldMap = pairs.iter().copied().collect();
        StoredRecord::from_fields(
            StreamEntryId::new(1, 0),
            &fields,
            &RawRecord::new("8=FIX.4.4"),
            Utc::now(),
        )
    }

    fn order(symbol: &str, side: &str, qty: &str, price: &str) -> StoredRecord {
        record(&[
            ("35", "D"),
            ("55", symbol),
            ("54", side),
            ("38", qty),
            ("44", price),
        ])
    }

    #[test]
    fn test_empty_population() {
        let snapshot = ReportSnapshot::compute(&[]);
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.unique_symbols, 0);
        assert!(snapshot.top_symbols.is_empty());
        assert!(snapshot.message_types.is_empty());
        assert_eq!(snapshot.sides.buy_pct(), Decimal::ZERO);
        assert_eq!(snapshot.sides.sell_pct(), Decimal::ZERO);
        assert_eq!(snapshot.sides.missing_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_volume_and_average_price() {
        let records = vec![
            order("AAPL", "1", "100", "150.00"),
            order("AAPL", "2", "200", "151.00"),
            order("AAPL", "1", "300", "152.00"),
        ];
        let snapshot = ReportSnapshot::compute(&records);

        assert_eq!(snapshot.top_symbols.len(), 1);
        let aapl = &snapshot.top_symbols[0];
        assert_eq!(aapl.symbol, "AAPL");
        assert_eq!(aapl.volume, Decimal::from(600));
        assert_eq!(aapl.avg_price, Decimal::from_str("151.00").unwrap());
    }

    #[test]
    fn test_average_rounds_half_up() {
        let records = vec![
            order("IBM", "1", "1", "10.001"),
            order("IBM", "1", "1", "10.009"),
        ];
        let snapshot = ReportSnapshot::compute(&records);
        assert_eq!(
            snapshot.top_symbols[0].avg_price,
            Decimal::from_str("10.01").unwrap()
        );
    }

    #[test]
    fn test_unparseable_quantity_does_not_contribute() {
        let records = vec![
            order("MSFT", "1", "abc", "300"),
            order("MSFT", "1", "50", "310"),
            order("TSLA", "1", "oops", "200"),
        ];
        let snapshot = ReportSnapshot::compute(&records);

        assert_eq!(snapshot.top_symbols.len(), 1);
        assert_eq!(snapshot.top_symbols[0].symbol, "MSFT");
        assert_eq!(snapshot.top_symbols[0].volume, Decimal::from(50));
        assert_eq!(snapshot.top_symbols[0].avg_price, Decimal::from(310));
        // Still counted as symbols
        assert_eq!(snapshot.unique_symbols, 2);
    }

    #[test]
    fn test_missing_price_does_not_contribute() {
        let records = vec![record(&[("55", "GOOG"), ("38", "100")])];
        let snapshot = ReportSnapshot::compute(&records);
        assert!(snapshot.top_symbols.is_empty());
        assert_eq!(snapshot.unique_symbols, 1);
    }

    #[test]
    fn test_overflowing_quantity_is_excluded() {
        let max = Decimal::MAX.to_string();
        let records = vec![
            order("AAPL", "1", &max, "150"),
            order("AAPL", "1", &max, "151"),
            order("AAPL", "2", "10", "152"),
        ];
        let snapshot = ReportSnapshot::compute(&records);

        let aapl = &snapshot.top_symbols[0];
        assert_eq!(aapl.volume, Decimal::MAX);
        assert_eq!(aapl.avg_price, Decimal::from(150));
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.sides.buy, 2);
    }

    #[test]
    fn test_non_positive_volume_excluded() {
        let records = vec![
            order("NFLX", "1", "-10", "400"),
            order("NFLX", "1", "10", "400"),
            order("AMD", "1", "0", "100"),
            order("META", "1", "5", "300"),
        ];
        let snapshot = ReportSnapshot::compute(&records);
        let names: Vec<_> = snapshot.top_symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(names, vec!["META"]);
    }

    #[test]
    fn test_top_five_ties_by_symbol() {
        let records = vec![
            order("ZZZ", "1", "100", "1"),
            order("AAA", "1", "100", "1"),
            order("BIG", "1", "500", "1"),
            order("CCC", "1", "50", "1"),
            order("DDD", "1", "40", "1"),
            order("EEE", "1", "30", "1"),
            order("FFF", "1", "20", "1"),
        ];
        let snapshot = ReportSnapshot::compute(&records);
        let names: Vec<_> = snapshot.top_symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(names, vec!["BIG", "AAA", "ZZZ", "CCC", "DDD"]);
    }

    #[test]
    fn test_side_buckets() {
        let records = vec![
            order("A", "1", "1", "1"),
            order("A", "1", "1", "1"),
            order("A", "2", "1", "1"),
            order("A", "5", "1", "1"),
            record(&[("35", "0")]),
        ];
        let sides = ReportSnapshot::compute(&records).sides;
        assert_eq!(sides.total, 5);
        assert_eq!(sides.buy, 2);
        assert_eq!(sides.sell, 1);
        assert_eq!(sides.other, 1);
        assert_eq!(sides.absent, 1);
        assert_eq!(sides.missing(), 2);
        assert_eq!(sides.buy_pct(), Decimal::from(40));
        assert_eq!(sides.missing_pct(), Decimal::from(40));
    }

    #[test]
    fn test_message_types_by_count_then_value() {
        let records = vec![
            record(&[("35", "D")]),
            record(&[("35", "8")]),
            record(&[("35", "D")]),
            record(&[("35", "F")]),
            record(&[("55", "AAPL")]),
        ];
        let snapshot = ReportSnapshot::compute(&records);
        let got: Vec<_> = snapshot
            .message_types
            .iter()
            .map(|m| (m.msg_type.as_str(), m.count))
            .collect();
        assert_eq!(got, vec![("D", 2), ("8", 1), ("F", 1)]);
    }

    proptest! {
        #[test]
        fn prop_side_percentages_sum_to_hundred(
            sides in proptest::collection::vec(prop_oneof![
                Just(Some("1")), Just(Some("2")), Just(Some("3")), Just(None)
            ], 1..200)
        ) {
            let records: Vec<StoredRecord> = sides
                .iter()
                .map(|side| match side {
                    Some(s) => record(&[("54", s)]),
                    None => record(&[("35", "D")]),
                })
                .collect();
            let sides = ReportSnapshot::compute(&records).sides;
            let sum = sides.buy_pct() + sides.sell_pct() + sides.missing_pct();
            let tolerance = Decimal::new(1, 12);
            prop_assert!((sum - Decimal::ONE_HUNDRED).abs() < tolerance);
        }

        #[test]
        fn prop_compute_ignores_record_order(
            rows in proptest::collection::vec(
                (0usize..6, prop_oneof![Just("10"), Just("x"), Just("-3"), Just("7.5")], 1u32..500),
                0..60
            ),
            seed in any::<u64>(),
        ) {
            let symbols = ["AAPL", "MSFT", "IBM", "TSLA", "AMZN", "NVDA"];
            let records: Vec<StoredRecord> = rows
                .iter()
                .map(|(s, qty, price)| order(symbols[*s], "1", qty, &price.to_string()))
                .collect();

            let mut shuffled = records.clone();
            let len = shuffled.len();
            if len > 1 {
                shuffled.rotate_left((seed as usize) % len);
            }

            let a = ReportSnapshot::compute(&records);
            let b = ReportSnapshot::compute(&shuffled);
            prop_assert_eq!(&a.top_symbols, &b.top_symbols);
            prop_assert_eq!(&a.message_types, &b.message_types);
            prop_assert!(a.top_symbols.len() <= TOP_SYMBOL_LIMIT);
            prop_assert!(a.top_symbols.iter().all(|s| s.volume > Decimal::ZERO));
        }
    }
}
