//! Integration tests from catalog selection through to the checkout summary

use rust_decimal::Decimal;
use rusty_money::iso::EUR;
use testresult::TestResult;

use storefront::{
    lines::{add_with_quantity, in_stock},
    prelude::*,
    variants::initial_selection,
};

#[test]
fn variant_matching_follows_selection_order() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let phone = fixture.product("phone")?;

    let black = Selection::new().with(Attribute::Color, "Black");
    let terabyte = Selection::new().with(Attribute::Storage, "1TB");

    let first_black = find_matching_variant(&phone.variants, &black).ok_or("variant")?;

    assert_eq!(first_black.id.as_deref(), Some("v-128"));
    assert!(find_matching_variant(&phone.variants, &terabyte).is_none());
    assert_eq!(phone.unit_price(&terabyte), Decimal::from(499));

    Ok(())
}

#[test]
fn initial_selection_resolves_to_first_variant() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let phone = fixture.product("phone")?;

    let selection = initial_selection(&phone.variants);
    let variant = phone.resolve_variant(&selection).ok_or("variant")?;

    assert!(selection.is_complete(&phone.variants));
    assert_eq!(variant.id.as_deref(), Some("v-128"));

    Ok(())
}

#[test]
fn disabled_variants_are_out_of_stock() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let phone = fixture.product("phone")?;

    let silver = Selection::new().with(Attribute::Color, "Silver");
    let variant = phone.resolve_variant(&silver).ok_or("variant")?;

    assert!(variant.is_disabled());
    assert_eq!(phone.stock_for(&silver), 0);

    Ok(())
}

#[test]
fn catalog_lines_match_backend_snapshot_totals() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let phone = fixture.product("phone")?;
    let case = fixture.product("case")?;
    let charger = fixture.product("charger")?;

    let black_128 = Selection::new()
        .with(Attribute::Storage, "128GB")
        .with(Attribute::Color, "Black");

    let mut lines = Vec::new();
    add_with_quantity(&mut lines, phone.to_line(phone.resolve_variant(&black_128)), 1)?;
    add_with_quantity(&mut lines, case.to_line(None), 2)?;
    add_with_quantity(&mut lines, charger.to_line(None), 1)?;

    let local = AggregateSnapshot {
        lines,
        ..AggregateSnapshot::default()
    };
    let backend = fixture.aggregate("cart")?;

    let local_subtotal: Decimal = local.lines.iter().map(|line| line.totals.base_total).sum();
    let local_tax: Decimal = local.lines.iter().map(|line| line.totals.tax_total).sum();

    assert_eq!(local_subtotal, backend.subtotal_without_tax());
    assert_eq!(local_tax, backend.tax_total());
    assert!(!in_stock(&local.lines, &charger.to_line(None).id));

    Ok(())
}

#[test]
fn checkout_summary_for_cart_fixture() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;
    let cart = fixture.aggregate("cart")?;
    let config = FormatConfig::new(EUR);

    let summary = CheckoutSummary::from_aggregate(&cart, &config);

    assert_eq!(summary.lines.len(), 3);
    assert_eq!(summary.tax_label, "Tax (4%)");
    assert!(summary.discount.is_some());
    assert!(summary.shipping.is_some());
    assert_eq!(summary.cod_fee, None);

    let mut out = Vec::new();
    summary.write_to(&mut out)?;

    assert!(String::from_utf8(out)?.contains("Fast Charger"));

    Ok(())
}

#[test]
fn deal_fixture_partitions() -> TestResult {
    let fixture = Fixture::from_set("storefront")?;

    let sections = partition_deals(fixture.deals().to_vec());

    assert_eq!(sections.main.len(), 1);
    assert_eq!(sections.special.len(), 1);
    assert_eq!(
        sections.main.first().and_then(|deal| deal.cta_url.as_deref()),
        Some("/product/fast-charger")
    );
    assert_eq!(
        sections.special.first().map(|deal| deal.cta_text.as_str()),
        Some("Grab it")
    );

    Ok(())
}
