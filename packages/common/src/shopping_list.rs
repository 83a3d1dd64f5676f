//! Consolidated shopping list built from a user's cart.

use std::collections::BTreeMap;

use crate::error::DomainResult;
use crate::model::{Actor, CartLine};
use crate::store::Store;

pub const HEADER: &str = "Shopping list";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Groups lines by `(name, unit)` and sums amounts. Output is sorted by name,
/// then unit.
pub fn aggregate<I>(lines: I) -> Vec<ShoppingItem>
where
    I: IntoIterator<Item = CartLine>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_default() += line.amount;
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

/// Plain-text rendering: header, blank line, one `name - amount unit` per item.
pub fn render(items: &[ShoppingItem]) -> String {
    let mut out = format!("{HEADER}\n\n");
    for item in items {
        out.push_str(&format!(
            "{} - {} {}\n",
            item.name, item.total_amount, item.measurement_unit
        ));
    }
    out
}

pub async fn build<S: Store + ?Sized>(store: &S, actor: &Actor) -> DomainResult<Vec<ShoppingItem>> {
    let lines = store.cart_lines(actor.user_id).await?;
    Ok(aggregate(lines))
}
