/*!
Read-side reporting. The aggregator computes named population-level and
per-agent values from the current model state without mutating anything; the
scheduler snapshots one record per step into the in-memory history, and a
single JSON writer can persist that history at the end of a run.
*/

use std::fs::File;

use serde_derive::Serialize;
use thiserror::Error;

use crate::consumer::EolPathway;
use crate::{Model, Role};

#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub year: u32,
    pub agents_repairing: usize,
    pub agents_selling: usize,
    pub agents_recycling: usize,
    pub agents_landfilling: usize,
    pub agents_hoarding: usize,
    /// Product volume still in operation across all consumers.
    pub in_operation: f64,
    pub volume_repaired: f64,
    pub volume_sold: f64,
    pub volume_recycled: f64,
    pub volume_landfilled: f64,
    pub volume_hoarded: f64,
    pub average_landfill_cost: f64,
    pub average_hoarding_cost: f64,
    pub average_recycling_cost: f64,
    pub average_repairing_cost: f64,
    /// Negated second-hand price: selling is income, not expense.
    pub average_selling_cost: f64,
    pub recycled_material_volume: f64,
    pub recycled_material_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub id: usize,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eol_pathway: Option<EolPathway>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_repaired: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_sold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_recycled: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_landfilled: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_hoarded: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landfill_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoarding_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recycling_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repairing_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_hand_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recycled_material_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recycled_material_value: Option<f64>,
}

impl AgentReport {
    fn empty(id: usize, role: Role) -> AgentReport {
        AgentReport {
            id,
            role,
            eol_pathway: None,
            volume_repaired: None,
            volume_sold: None,
            volume_recycled: None,
            volume_landfilled: None,
            volume_hoarded: None,
            landfill_cost: None,
            hoarding_cost: None,
            recycling_cost: None,
            repairing_cost: None,
            second_hand_price: None,
            material: None,
            recycled_material_volume: None,
            recycled_material_value: None,
        }
    }
}

/// One collected step: the population aggregates and the per-agent table.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub model: ModelReport,
    pub agents: Vec<AgentReport>,
}

pub fn collect(model: &Model) -> StepRecord {
    StepRecord {
        model: model_report(model),
        agents: agent_reports(model),
    }
}

pub fn model_report(model: &Model) -> ModelReport {
    let p = model.parameters();
    let count = |pathway: EolPathway| {
        model
            .consumers
            .iter()
            .filter(|c| c.eol_pathway == pathway)
            .count()
    };
    // Volume that recyclers triaged out for refurbishment over the whole
    // run: it left the recycling stream and entered the resale stream.
    let repairable_total: f64 = model
        .recyclers
        .iter()
        .map(|r| r.total_repairable_volume)
        .sum();
    let consumer_sum = |f: fn(&crate::consumer::Consumer) -> f64| -> f64 {
        model.consumers.iter().map(f).sum()
    };
    ModelReport {
        year: model.year(),
        agents_repairing: count(EolPathway::Repair),
        agents_selling: count(EolPathway::Sell),
        agents_recycling: count(EolPathway::Recycle),
        agents_landfilling: count(EolPathway::Landfill),
        agents_hoarding: count(EolPathway::Hoard),
        in_operation: model.consumers.iter().map(|c| c.stock_in_operation()).sum(),
        volume_repaired: consumer_sum(|c| c.volume_repaired),
        volume_sold: consumer_sum(|c| c.volume_sold) + repairable_total,
        volume_recycled: consumer_sum(|c| c.volume_recycled) - repairable_total,
        volume_landfilled: consumer_sum(|c| c.volume_landfilled),
        volume_hoarded: consumer_sum(|c| c.volume_hoarded),
        average_landfill_cost: consumer_sum(|c| c.landfill_cost()) / p.num_consumers as f64,
        average_hoarding_cost: consumer_sum(|c| c.hoarding_cost()) / p.num_consumers as f64,
        average_recycling_cost: model.recyclers.iter().map(|r| r.recycling_cost).sum::<f64>()
            / p.num_recyclers as f64,
        average_repairing_cost: model
            .refurbishers
            .iter()
            .map(|f| f.repairing_cost)
            .sum::<f64>()
            / p.num_refurbishers as f64,
        average_selling_cost: model
            .refurbishers
            .iter()
            .map(|f| -f.second_hand_price)
            .sum::<f64>()
            / p.num_refurbishers as f64,
        recycled_material_volume: model
            .producers
            .iter()
            .map(|q| q.recycled_material_volume)
            .sum(),
        recycled_material_value: model
            .producers
            .iter()
            .map(|q| q.recycled_material_value)
            .sum(),
    }
}

pub fn agent_reports(model: &Model) -> Vec<AgentReport> {
    let p = model.parameters();
    let mut reports = Vec::with_capacity(p.num_agents());
    for (i, c) in model.consumers.iter().enumerate() {
        let mut report = AgentReport::empty(i, Role::Consumer);
        report.eol_pathway = Some(c.eol_pathway);
        report.volume_repaired = Some(c.volume_repaired);
        report.volume_sold = Some(c.volume_sold);
        report.volume_recycled = Some(c.volume_recycled);
        report.volume_landfilled = Some(c.volume_landfilled);
        report.volume_hoarded = Some(c.volume_hoarded);
        report.landfill_cost = Some(c.landfill_cost());
        report.hoarding_cost = Some(c.hoarding_cost());
        reports.push(report);
    }
    let mut id = p.num_consumers;
    for r in model.recyclers.iter() {
        let mut report = AgentReport::empty(id, Role::Recycler);
        report.recycling_cost = Some(r.recycling_cost);
        reports.push(report);
        id += 1;
    }
    for q in model.producers.iter() {
        let mut report = AgentReport::empty(id, Role::Producer);
        report.material = Some(p.materials[q.material].name.clone());
        report.recycled_material_volume = Some(q.recycled_material_volume);
        report.recycled_material_value = Some(q.recycled_material_value);
        reports.push(report);
        id += 1;
    }
    for f in model.refurbishers.iter() {
        let mut report = AgentReport::empty(id, Role::Refurbisher);
        report.repairing_cost = Some(f.repairing_cost);
        report.second_hand_price = Some(f.second_hand_price);
        reports.push(report);
        id += 1;
    }
    reports
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not write the report file")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize the report history")]
    Serialize(#[from] serde_json::Error),
}

/// Write the collected history as one JSON document. The only persistence
/// the model offers; anything richer belongs to external tooling.
pub fn store_history(history: &[StepRecord], statefile: &str) -> Result<(), StoreError> {
    let file = File::create(statefile)?;
    serde_json::to_writer_pretty(file, history)?;
    Ok(())
}
