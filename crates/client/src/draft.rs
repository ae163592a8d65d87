//! Draft transaction builder.
//!
//! A draft is the client-side, not-yet-committed line set of one adjustment or
//! order. Lines always hold a positive quantity: any operation that would drop
//! a line to zero removes it instead.

use serde::{Deserialize, Serialize};

use aquaroute_core::{DomainError, DomainResult, Money, ProductId};
use aquaroute_products::Product;

/// Snapshot of the product a line refers to, taken when the line was added.
///
/// `unit_price` is the sale price at that moment; it is what an order line
/// sends as `price_at_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub unit_type: String,
    pub unit_price: Money,
}

impl ProductRef {
    /// Stand-in for a product only known by id (e.g. a remote item snapshot).
    pub fn placeholder(id: ProductId) -> Self {
        Self {
            id,
            name: format!("Product #{id}"),
            unit_type: String::new(),
            unit_price: Money::ZERO,
        }
    }
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            unit_type: product.unit_type.clone(),
            unit_price: product.sale_price,
        }
    }
}

impl From<Product> for ProductRef {
    fn from(product: Product) -> Self {
        Self::from(&product)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    product: ProductRef,
    quantity: u32,
}

impl DraftLine {
    pub fn product(&self) -> &ProductRef {
        &self.product
    }

    pub fn product_id(&self) -> ProductId {
        self.product.id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn amount(&self) -> Money {
        self.product.unit_price.times(self.quantity)
    }
}

/// What `add_item` does when the product already has a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinePolicy {
    /// Append a second line for the same product (adjustment form behaviour).
    #[default]
    Append,
    /// Add to the existing line's quantity; the first line's price is kept
    /// (cart behaviour).
    MergeByProduct,
}

fn positive(quantity: i64) -> DomainResult<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(DomainError::InvalidQuantity(quantity))
}

/// Ordered, in-memory line set of one in-progress transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftBuilder {
    policy: LinePolicy,
    lines: Vec<DraftLine>,
}

impl DraftBuilder {
    pub fn new(policy: LinePolicy) -> Self {
        Self {
            policy,
            lines: Vec::new(),
        }
    }

    pub fn policy(&self) -> LinePolicy {
        self.policy
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` units of `product`. Rejects non-positive quantities.
    pub fn add_item(&mut self, product: impl Into<ProductRef>, quantity: i64) -> DomainResult<()> {
        let quantity = positive(quantity)?;
        let product = product.into();

        if self.policy == LinePolicy::MergeByProduct {
            if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(DomainError::InvalidQuantity(i64::from(quantity)))?;
                return Ok(());
            }
        }

        self.lines.push(DraftLine { product, quantity });
        Ok(())
    }

    /// Shift the first line of `product` by `delta`.
    ///
    /// A line reaching zero or below is removed. An absent product with a
    /// positive delta gets a new line of quantity 1. An absent product with a
    /// non-positive delta is a no-op.
    pub fn update_quantity(&mut self, product: impl Into<ProductRef>, delta: i64) -> DomainResult<()> {
        let product = product.into();
        let Some(index) = self.lines.iter().position(|l| l.product.id == product.id) else {
            if delta > 0 {
                self.lines.push(DraftLine {
                    product,
                    quantity: 1,
                });
            }
            return Ok(());
        };

        let next = i64::from(self.lines[index].quantity).saturating_add(delta);
        if next <= 0 {
            self.lines.remove(index);
            return Ok(());
        }
        self.lines[index].quantity = u32::try_from(next).map_err(|_| DomainError::InvalidQuantity(next))?;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> DomainResult<DraftLine> {
        if index >= self.lines.len() {
            return Err(DomainError::IndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    /// Sum of quantity x unit price, recomputed on every call.
    pub fn total(&self) -> Money {
        self.lines.iter().map(DraftLine::amount).sum()
    }

    /// Replace the product snapshot of every line for `product.id`.
    ///
    /// Used to swap placeholders for real catalog data; carts never call it
    /// so their captured prices stay put.
    pub fn refresh_product(&mut self, product: &ProductRef) {
        for line in self.lines.iter_mut().filter(|l| l.product.id == product.id) {
            line.product = product.clone();
        }
    }

    pub fn reset(&mut self) {
        self.lines.clear();
    }

    /// Lines as `(product, quantity)` pairs.
    pub fn pairs(&self) -> Vec<(ProductId, u32)> {
        self.lines.iter().map(|l| (l.product.id, l.quantity)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u64, cents: u64) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: format!("p{id}"),
            unit_type: "unit".to_string(),
            unit_price: Money::from_cents(cents),
        }
    }

    #[test]
    fn add_rejects_non_positive_quantities() {
        let mut draft = DraftBuilder::new(LinePolicy::Append);
        assert_eq!(draft.add_item(product(1, 100), 0), Err(DomainError::InvalidQuantity(0)));
        assert_eq!(draft.add_item(product(1, 100), -3), Err(DomainError::InvalidQuantity(-3)));
        assert!(draft.is_empty());
    }

    #[test]
    fn duplicate_policy_is_explicit() {
        let mut append = DraftBuilder::new(LinePolicy::Append);
        append.add_item(product(1, 100), 2).unwrap();
        append.add_item(product(1, 100), 3).unwrap();
        assert_eq!(append.pairs(), vec![(ProductId::new(1), 2), (ProductId::new(1), 3)]);

        let mut merge = DraftBuilder::new(LinePolicy::MergeByProduct);
        merge.add_item(product(1, 100), 2).unwrap();
        merge.add_item(product(1, 150), 3).unwrap();
        assert_eq!(merge.pairs(), vec![(ProductId::new(1), 5)]);
        // price captured by the first add
        assert_eq!(merge.total(), Money::from_cents(500));
    }

    #[test]
    fn update_quantity_adds_removes_and_creates() {
        let mut draft = DraftBuilder::default();
        draft.update_quantity(product(4, 250), 5).unwrap();
        assert_eq!(draft.pairs(), vec![(ProductId::new(4), 1)]);

        draft.update_quantity(product(4, 250), 2).unwrap();
        assert_eq!(draft.pairs(), vec![(ProductId::new(4), 3)]);

        draft.update_quantity(product(4, 250), -3).unwrap();
        assert!(draft.is_empty());

        draft.update_quantity(product(9, 1), -1).unwrap();
        assert!(draft.is_empty());
    }

    #[test]
    fn remove_out_of_range() {
        let mut draft = DraftBuilder::default();
        draft.add_item(product(1, 1), 1).unwrap();
        assert_eq!(
            draft.remove_item(1),
            Err(DomainError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(draft.remove_item(0).unwrap().quantity(), 1);
    }

    #[test]
    fn total_follows_refreshed_prices() {
        let mut draft = DraftBuilder::default();
        draft.add_item(ProductRef::placeholder(ProductId::new(2)), 3).unwrap();
        assert_eq!(draft.total(), Money::ZERO);

        draft.refresh_product(&product(2, 1250));
        assert_eq!(draft.total(), Money::from_cents(3750));
        assert_eq!(draft.lines()[0].product().name, "p2");

        draft.reset();
        assert_eq!(draft.total(), Money::ZERO);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u64, i64),
            Update(u64, i64),
            Remove(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u64..5, -3i64..10).prop_map(|(p, q)| Op::Add(p, q)),
                (1u64..5, -12i64..12).prop_map(|(p, d)| Op::Update(p, d)),
                (0usize..8).prop_map(Op::Remove),
            ]
        }

        fn policy() -> impl Strategy<Value = LinePolicy> {
            prop_oneof![Just(LinePolicy::Append), Just(LinePolicy::MergeByProduct)]
        }

        proptest! {
            #[test]
            fn lines_stay_positive_and_total_is_fresh(
                policy in policy(),
                ops in proptest::collection::vec(op(), 0..40),
            ) {
                let mut draft = DraftBuilder::new(policy);
                for op in ops {
                    let before = draft.clone();
                    let result = match op {
                        Op::Add(p, q) => draft.add_item(product(p, p * 100), q),
                        Op::Update(p, d) => draft.update_quantity(product(p, p * 100), d),
                        Op::Remove(i) => draft.remove_item(i).map(|_| ()),
                    };
                    if result.is_err() {
                        prop_assert_eq!(&draft, &before);
                    }

                    prop_assert!(draft.lines().iter().all(|l| l.quantity() > 0));
                    let expected: u64 = draft
                        .lines()
                        .iter()
                        .map(|l| l.product().unit_price.cents() * u64::from(l.quantity()))
                        .sum();
                    prop_assert_eq!(draft.total().cents(), expected);
                }

                if policy == LinePolicy::MergeByProduct {
                    let mut ids = draft.pairs().into_iter().map(|(p, _)| p).collect::<Vec<_>>();
                    let n = ids.len();
                    ids.sort();
                    ids.dedup();
                    prop_assert_eq!(ids.len(), n);
                }
            }
        }
    }
}
