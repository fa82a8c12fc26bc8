//! Integration tests for price resolution and line totals

use proptest::{collection, option, prelude::*};
use rust_decimal::Decimal;
use serde_json::json;
use testresult::TestResult;

use storefront::{
    lines::{Line, LineId},
    pricing::{
        PricingFields, base_price_for_display, discount_percent, effective_unit_price,
        has_active_deal, has_active_sale,
    },
    totals::{compute_line_totals, grand_total, line_totals, subtotal_without_tax, tax_total},
};

fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Amounts with up to two decimal places, including zero and negatives.
fn amount() -> impl Strategy<Value = Decimal> {
    (-10_000_i64..1_000_000, 0_u32..3).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn pricing() -> impl Strategy<Value = PricingFields> {
    (amount(), option::of(amount()), option::of(amount()), option::of(amount())).prop_map(
        |(price, original_price, deal_price, sale_price)| PricingFields {
            price,
            original_price,
            deal_price,
            sale_price,
        },
    )
}

/// Tax percentages, absent, zero or negative included.
fn tax() -> impl Strategy<Value = Option<Decimal>> {
    option::of((-500_i64..5_000, 0_u32..2).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale)))
}

fn lines() -> impl Strategy<Value = Vec<Line>> {
    collection::vec((pricing(), 1_u32..50, tax()), 0..30).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(n, (pricing, quantity, tax))| {
                let mut line = Line {
                    quantity,
                    tax,
                    ..Line::new(LineId::from(format!("line-{n}")), format!("p-{n}"), pricing)
                };
                line.refresh_totals();
                line
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn active_deal_law_holds(original in option::of(amount()), deal in option::of(amount())) {
        let expected = matches!(
            (original, deal),
            (Some(o), Some(p)) if o > Decimal::ZERO && p > Decimal::ZERO && p < o
        );

        prop_assert_eq!(has_active_deal(original, deal), expected);
    }

    #[test]
    fn active_sale_law_holds(price in amount(), sale in option::of(amount())) {
        let expected =
            sale.is_some_and(|s| price > Decimal::ZERO && s > Decimal::ZERO && s < price);

        prop_assert_eq!(has_active_sale(price, sale), expected);
    }

    #[test]
    fn effective_price_never_exceeds_base_price(fields in pricing()) {
        if let Some(base) = base_price_for_display(&fields) {
            prop_assert!(effective_unit_price(&fields) < base);
            prop_assert!(discount_percent(&fields).is_some());
        } else {
            prop_assert_eq!(discount_percent(&fields), None);
        }
    }

    #[test]
    fn subtotal_plus_tax_equals_sum_of_grand_totals(lines in lines()) {
        let summed: Decimal = lines.iter().map(|line| line_totals(line).grand_total).sum();

        prop_assert_eq!(subtotal_without_tax(&lines) + tax_total(&lines), summed);
        prop_assert_eq!(grand_total(&lines), summed);
    }

    #[test]
    fn subtotal_charges_effective_unit_price(lines in lines()) {
        let expected: Decimal = lines
            .iter()
            .map(|line| effective_unit_price(&line.pricing) * Decimal::from(line.quantity))
            .sum();

        prop_assert_eq!(subtotal_without_tax(&lines), expected);
    }
}

#[test]
fn deal_takes_priority_over_sale() {
    let fields = PricingFields {
        price: d(100),
        original_price: Some(d(100)),
        deal_price: Some(d(80)),
        sale_price: Some(d(90)),
    };

    assert_eq!(effective_unit_price(&fields), d(80));
    assert_eq!(base_price_for_display(&fields), Some(d(100)));
    assert_eq!(discount_percent(&fields), Some(20));
}

#[test]
fn line_totals_scale_with_quantity() {
    let totals = compute_line_totals(d(25), 3, Some(d(4)));

    assert_eq!((totals.base_total, totals.tax_total, totals.grand_total), (d(75), d(3), d(78)));

    let clamped = compute_line_totals(d(25), 0, None);

    assert_eq!((clamped.base_total, clamped.tax_total, clamped.grand_total), (d(25), d(0), d(25)));
}

#[test]
fn discounted_lines_subtotal_below_list_price() {
    let lines = [
        Line {
            quantity: 2,
            ..Line::new(
                LineId::from("deal"),
                "p-1",
                PricingFields {
                    price: d(100),
                    original_price: Some(d(100)),
                    deal_price: Some(d(70)),
                    sale_price: None,
                },
            )
        },
        Line::new(
            LineId::from("sale"),
            "p-2",
            PricingFields {
                price: d(40),
                sale_price: Some(d(30)),
                ..PricingFields::default()
            },
        ),
    ];

    assert_eq!(subtotal_without_tax(&lines), d(170));
}

#[test]
fn malformed_backend_lines_default_safely() -> TestResult {
    let line = Line::from_json(&json!({
        "id": "x",
        "price": null,
        "originalPrice": "abc",
        "dealPrice": -3,
        "quantity": -2,
        "tax": "not a number"
    }))
    .ok_or("line")?;

    assert_eq!(line.quantity, 1);
    assert_eq!(line.tax, None);
    assert_eq!(effective_unit_price(&line.pricing), Decimal::ZERO);
    assert_eq!(discount_percent(&line.pricing), None);
    assert_eq!(line.display_total(), Decimal::ZERO);

    Ok(())
}
