//! Ranking report
//!
//! Renders an [`OptimizationResult`] as a console table: the store
//! ranking with totals, coverage and badges, followed by the recommended
//! plan. The caller supplies the sink, so no UI concern leaks in here.

use std::io;

use tabled::{
    builder::Builder,
    settings::{Alignment, Color, Style, object::{Columns, Rows}},
};
use thiserror::Error;

use crate::optimizer::{OptimizationResult, StoreAllocation};

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapped IO error from the output sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Console renderer for optimization results.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingReport;

impl RankingReport {
    /// Writes the ranking table and decision summary to the given sink.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if writing to the sink fails.
    pub fn write_to(
        out: &mut impl io::Write,
        result: &OptimizationResult<'_>,
    ) -> Result<(), ReportError> {
        if !result.has_enough_data() {
            writeln!(out, "Not enough price data to rank stores.")?;
            write_missing(out, result.missing_products())?;
            return Ok(());
        }

        write_ranking_table(out, result)?;
        write_missing(out, result.missing_products())?;
        write_decision(out, result)?;

        Ok(())
    }
}

fn write_ranking_table(
    out: &mut impl io::Write,
    result: &OptimizationResult<'_>,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record(["", "Store", "Total", "Coverage", "vs Best", "Badge"]);

    for entry in result.ranking() {
        builder.push_record([
            format!("#{}", entry.rank),
            entry.store.clone(),
            format!("{}", entry.total),
            format!("{}%", entry.coverage_percent),
            if entry.rank == 1 {
                String::new()
            } else {
                format!("+{} ({}%)", entry.difference_vs_best, entry.percent_more_vs_best)
            },
            entry.badge.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

fn write_missing(out: &mut impl io::Write, missing: &[String]) -> Result<(), ReportError> {
    if !missing.is_empty() {
        writeln!(out, "No prices yet for: {}", missing.join(", "))?;
    }

    Ok(())
}

fn write_decision(
    out: &mut impl io::Write,
    result: &OptimizationResult<'_>,
) -> Result<(), ReportError> {
    let Some(optimization) = result.optimization() else {
        return Ok(());
    };

    let decision = &optimization.decision;

    writeln!(
        out,
        "Recommended: {} at {} (saves {} vs the dearest ranked store)",
        decision.strategy, decision.total, decision.savings_vs_worst,
    )?;

    if optimization.savings.to_minor_units() > 0 {
        writeln!(
            out,
            "Splitting the shop saves {} ({}%) over {}",
            optimization.savings, optimization.savings_percent, optimization.single_store.store,
        )?;
    }

    for allocation in &decision.allocations {
        write_allocation(out, allocation)?;
    }

    Ok(())
}

fn write_allocation(
    out: &mut impl io::Write,
    allocation: &StoreAllocation<'_>,
) -> Result<(), ReportError> {
    writeln!(out, "  {} - {}", allocation.store, allocation.subtotal)?;

    for item in &allocation.items {
        writeln!(
            out,
            "    {} x{} @ {} = {}",
            item.product_name, item.quantity, item.unit_price, item.line_total,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::ARS};
    use testresult::TestResult;

    use crate::{
        cart::{Cart, CartRepository},
        optimizer::CartOptimizer,
        prices::{PriceBook, PriceObservation, PriceRepository},
    };

    use super::*;

    fn render(result: &OptimizationResult<'_>) -> TestResult<String> {
        let mut out = Vec::new();
        RankingReport::write_to(&mut out, result)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn renders_ranking_and_decision() -> TestResult {
        let mut cart = Cart::new();
        cart.add("Milk", 2)?;

        let mut book = PriceBook::new(ARS);
        for (store, minor) in [("StoreA", 500), ("StoreB", 450)] {
            book.record(PriceObservation::new(
                "Milk",
                store,
                Money::from_minor(minor, ARS),
                chrono::Utc::now(),
            ))?;
        }

        let result = CartOptimizer::default().optimize(&cart.snapshot(), &book)?;
        let rendered = render(&result)?;

        assert!(rendered.contains("StoreB"), "missing winning store");
        assert!(rendered.contains("cheapest"), "missing badge");
        assert!(rendered.contains("single_store"), "missing strategy");

        Ok(())
    }

    #[test]
    fn reports_insufficient_data() -> TestResult {
        let mut cart = Cart::new();
        cart.add("Yerba", 1)?;

        let book = PriceBook::new(ARS);

        let result = CartOptimizer::default().optimize(&cart.snapshot(), &book)?;
        let rendered = render(&result)?;

        assert!(rendered.contains("Not enough price data"), "missing notice");
        assert!(rendered.contains("Yerba"), "missing product listing");

        Ok(())
    }
}
