//! Incident analysis example
//!
//! Walks an earthquake near Hsinchu through the full pipeline, scans a few
//! live-feed events for alerts and prints the portfolio outlook.
//!
//! Run with `RUST_LOG=debug` to see the pipeline's tracing output.

use supply_chain_risk_engine::{
    AlertDetector, CannedAdvisory, CriticalityLevel, EventClassifier, FeedEvent, FeedLocation,
    IncidentPipeline, IncidentType, InMemoryRepository, ParsedIncident, PortfolioAnalyzer,
    Supplier, SupplierCategory, SupplierDependencyEdge, SupplierRepository, SupplierTier,
};
use tracing_subscriber::EnvFilter;

const ORG: i64 = 1;

fn build_repository() -> InMemoryRepository {
    let mut repo = InMemoryRepository::new();
    let suppliers = vec![
        Supplier::new(1, "Hsinchu Foundry", "Taiwan", SupplierCategory::Components, CriticalityLevel::Critical)
            .with_city("Hsinchu")
            .with_location(24.8138, 120.9675)
            .with_lead_time(45),
        Supplier::new(2, "Taichung Precision", "Taiwan", SupplierCategory::Components, CriticalityLevel::High)
            .with_city("Taichung")
            .with_location(24.1477, 120.6736)
            .with_tier(SupplierTier::Tier2),
        Supplier::new(3, "Osaka Components", "Japan", SupplierCategory::Components, CriticalityLevel::Medium)
            .with_city("Osaka")
            .with_location(34.6937, 135.5023)
            .with_reliability(92.0)
            .with_capacity_utilization(55.0)
            .with_lead_time(21),
        Supplier::new(4, "Penang Semiconductors", "Malaysia", SupplierCategory::Components, CriticalityLevel::Medium)
            .with_location(5.4164, 100.3327)
            .with_reliability(88.0)
            .with_capacity_utilization(90.0),
        Supplier::new(5, "Dresden Assembly", "Germany", SupplierCategory::FinishedGoods, CriticalityLevel::High)
            .with_location(51.0504, 13.7373),
        Supplier::new(6, "Rotterdam Freight", "Netherlands", SupplierCategory::Logistics, CriticalityLevel::Low)
            .with_location(51.9244, 4.4777)
            .with_lead_time(75),
    ];
    for supplier in suppliers {
        repo.add_supplier(ORG, supplier);
    }

    repo.add_dependency(ORG, SupplierDependencyEdge::new(5, 1, "wafers"));
    repo.add_dependency(ORG, SupplierDependencyEdge::new(5, 3, "modules"));
    repo.add_dependency(ORG, SupplierDependencyEdge::new(6, 5, "outbound freight"));
    repo
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Supply-Chain Risk Engine ===\n");

    let repository = build_repository();
    let suppliers = repository.suppliers_for_organization(ORG)?;

    // Example 1: Earthquake near Hsinchu
    println!("1. Analyzing Earthquake Near Hsinchu");
    let incident = ParsedIncident::new(IncidentType::NaturalDisaster, 5)
        .with_country("Taiwan")
        .with_city("Hsinchu")
        .with_location(24.8138, 120.9675)
        .with_industry("semiconductors")
        .with_summary("Magnitude 7.4 earthquake near Hsinchu Science Park");

    let pipeline = IncidentPipeline::new(repository, CannedAdvisory);
    let analysis = pipeline.analyze(ORG, &incident)?;
    let assessment = &analysis.assessment;

    println!("   Affected Suppliers: {}", analysis.matches.affected_count);
    for m in &analysis.matches.matches {
        println!("     - {} ({}, proximity {:.2})", m.supplier_name, m.reason, m.proximity_score);
    }
    println!(
        "   Cascading Impacts: {:?}",
        analysis
            .cascading_suppliers
            .iter()
            .map(|s| s.supplier_name.as_str())
            .collect::<Vec<_>>()
    );
    println!(
        "   Overall Risk: {:.2}/100 ({})",
        assessment.overall_risk_score, assessment.risk_level
    );
    println!(
        "   Estimated Loss: ${:.0} over {} days",
        assessment.financial_impact.total_estimated_loss,
        assessment.financial_impact.estimated_resolution_days
    );
    for group in &analysis.alternatives {
        println!("   Alternatives for {}:", group.affected_supplier_name);
        for alt in &group.alternatives {
            println!("     - {} ({:.2})", alt.supplier_name, alt.total_score);
        }
    }
    println!("   Immediate Actions: {:?}", analysis.immediate_actions);
    println!("   Processing Time: {}ms", analysis.processing_time_ms);
    println!();

    // Example 2: Live-feed alert scan
    println!("2. Scanning Live-Feed Events");
    let classifier = EventClassifier::new()?;
    let events = vec![
        FeedEvent::from_article(&classifier, "GDELT", "Port workers strike in Kaohsiung", -3.5)
            .with_location(FeedLocation::country("Taiwan").with_point(22.6273, 120.3014)),
        FeedEvent::from_article(&classifier, "GDELT", "Trade fair opens in Munich", 2.0)
            .with_location(FeedLocation::country("Germany").with_point(48.1351, 11.5820)),
        FeedEvent::from_noaa_alert("Hurricane warning for Gulf Coast", "Extreme", "Louisiana"),
    ];

    let mut detector = AlertDetector::new();
    let alerts = detector.scan(&events, &suppliers);
    println!("   Alerts Generated: {}", alerts.len());
    for alert in &alerts {
        println!(
            "     - [{}] {} (impact {:.0}, {} suppliers)",
            alert.severity, alert.title, alert.impact_score, alert.affected_count
        );
    }
    println!();

    // Example 3: Portfolio outlook
    println!("3. Portfolio Outlook");
    let outlook = PortfolioAnalyzer::new().analyze(&suppliers);
    println!("   Predicted Risk: {:.2}/100", outlook.predicted_risk_score);
    println!("   Confidence: {:.0}%", outlook.confidence_level);
    for factor in &outlook.risk_factors {
        println!("     - {}: {}", factor.kind, factor.description);
    }
    println!();

    // Example 4: JSON export
    println!("4. Exporting Assessment to JSON");
    let json = assessment.to_json()?;
    println!("{}", json);

    Ok(())
}
