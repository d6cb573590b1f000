//! Top-N popularity rankings, globally and per country or month.

use retail_core::{normalize, GroupKey, RankingEntry, RankingScope, RankingView, Transaction};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Rank products by summed quantity within every grouping value of `scope`.
///
/// Each key keeps at most `n` entries, sorted by descending quantity; ties
/// keep the order in which products first appear in `transactions`.
pub fn top_n(transactions: &[Transaction], scope: RankingScope, n: usize) -> RankingView {
    let rows = transactions
        .iter()
        .map(|tx| (GroupKey::for_transaction(scope, tx), tx));
    let entries = rank(rows, n);
    debug!(?scope, n, entries = entries.len(), "Ranking computed");
    RankingView { scope, n, entries }
}

/// Rank products for a single grouping value. A key with no matching rows
/// yields an empty vector.
pub fn top_n_for(transactions: &[Transaction], key: &GroupKey, n: usize) -> Vec<RankingEntry> {
    let scope = key.scope();
    let rows = transactions.iter().filter_map(|tx| {
        let tx_key = GroupKey::for_transaction(scope, tx);
        (&tx_key == key).then_some((tx_key, tx))
    });
    rank(rows, n)
}

struct Tally {
    description: String,
    quantity: i64,
}

fn rank<'a>(rows: impl Iterator<Item = (GroupKey, &'a Transaction)>, n: usize) -> Vec<RankingEntry> {
    // Per key: product totals in first-appearance order.
    let mut groups: BTreeMap<GroupKey, (HashMap<String, usize>, Vec<Tally>)> = BTreeMap::new();

    for (key, tx) in rows {
        let (index, tallies) = groups.entry(key).or_default();
        match index.entry(normalize(&tx.description)) {
            Entry::Occupied(slot) => tallies[*slot.get()].quantity += tx.quantity,
            Entry::Vacant(slot) => {
                slot.insert(tallies.len());
                tallies.push(Tally {
                    description: tx.description.trim().to_string(),
                    quantity: tx.quantity,
                });
            }
        }
    }

    let mut entries = Vec::new();
    for (key, (_, mut tallies)) in groups {
        tallies.sort_by(|a, b| b.quantity.cmp(&a.quantity));
        entries.extend(tallies.into_iter().take(n).map(|t| RankingEntry {
            key: key.clone(),
            description: t.description,
            quantity: t.quantity,
        }));
    }
    entries
}
