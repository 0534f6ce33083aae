//! # G6 距离客户端
//!
//! 约化晶胞（G6 向量）距离由外部服务计算，本模块负责输入校验、
//! 请求组装、响应解析以及按容差筛选排序。
//!
//! ## 请求格式
//! ```json
//! {"reference_cell": [a, b, c, α, β, γ], "cells": {"12": [...], "15": [...]}}
//! ```
//! 响应为与 `cells` 键顺序对应的数字数组，或
//! `[{"cell_id": "12", "g6_distance": 3.2}, ...]`。
//!
//! ## 依赖关系
//! - 被 `commands/cell.rs` 使用
//! - 使用 `api/transport.rs`、`models/cell.rs`

use super::transport::{CellApiTransport, HttpTransport, HEALTH_PATH};
use super::G6_DISTANCE_ENDPOINT;
use crate::config::Settings;
use crate::models::CellParams;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// 参与比较的数据集：ID + 原胞参数（可能缺失）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetCell {
    pub id: u64,
    #[serde(default)]
    pub primitive_cell: Option<CellParams>,
}

impl DatasetCell {
    pub fn new(id: u64, primitive_cell: Option<CellParams>) -> Self {
        DatasetCell { id, primitive_cell }
    }

    pub fn has_primitive_cell(&self) -> bool {
        self.primitive_cell.map(|c| c.is_valid()).unwrap_or(false)
    }
}

/// 一个相似数据集及其距离
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarDataset {
    pub dataset_id: u64,
    pub distance: f64,
}

/// 规范化的相似度记录（较小 ID 在前）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityRecord {
    pub dataset_1_id: u64,
    pub dataset_2_id: u64,
    pub g6_distance: f64,
}

/// G6 距离 API 客户端
pub struct G6DistanceClient<T = HttpTransport> {
    transport: Option<T>,
}

impl G6DistanceClient<HttpTransport> {
    /// 端点为空白时客户端处于关闭状态
    pub fn from_settings(settings: &Settings) -> Self {
        G6DistanceClient {
            transport: HttpTransport::from_settings(settings),
        }
    }
}

impl<T: CellApiTransport> G6DistanceClient<T> {
    pub fn with_transport(transport: T) -> Self {
        G6DistanceClient {
            transport: Some(transport),
        }
    }

    pub fn disabled() -> Self {
        G6DistanceClient { transport: None }
    }

    pub fn enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// 计算参考晶胞到各个带 ID 晶胞的距离
    ///
    /// 关闭、参考晶胞无效、没有可比较晶胞或请求失败时返回 `None`。
    /// 无效的比较晶胞不发送。
    pub fn calculate_distances_with_ids(
        &self,
        reference: &CellParams,
        cells: &[(u64, CellParams)],
    ) -> Option<BTreeMap<u64, f64>> {
        let transport = self.transport.as_ref()?;
        let Some(reference) = reference.to_api_array() else {
            debug!("Reference cell is incomplete; skipping G6 comparison");
            return None;
        };

        let mut sent = Map::new();
        for (id, params) in cells {
            match params.to_api_array() {
                Some(values) => {
                    sent.insert(id.to_string(), json!(values));
                }
                None => debug!("Dataset {} has no valid cell; not compared", id),
            }
        }
        if sent.is_empty() {
            return None;
        }

        let sent_ids: Vec<u64> = sent.keys().filter_map(|k| k.parse().ok()).collect();
        let body = json!({
            "reference_cell": reference,
            "cells": Value::Object(sent),
        });

        match transport.post_json(G6_DISTANCE_ENDPOINT, &body) {
            Ok(response) => parse_distance_response(&response, &sent_ids),
            Err(e) => {
                error!("G6 distance API request failed: {}", e);
                None
            }
        }
    }

    /// 按输入顺序返回距离；某个晶胞没有结果时对应位置为 `None`
    pub fn calculate_distances(
        &self,
        reference: &CellParams,
        cells: &[CellParams],
    ) -> Option<Vec<Option<f64>>> {
        if cells.is_empty() {
            return None;
        }

        let with_ids: Vec<(u64, CellParams)> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| (i as u64 + 1, *c))
            .collect();
        let distances = self.calculate_distances_with_ids(reference, &with_ids)?;

        Some(
            with_ids
                .iter()
                .map(|(id, _)| distances.get(id).copied())
                .collect(),
        )
    }

    pub fn calculate_distance(&self, cell1: &CellParams, cell2: &CellParams) -> Option<f64> {
        self.calculate_distances(cell1, std::slice::from_ref(cell2))?
            .first()
            .copied()
            .flatten()
    }

    /// 距离不超过 `tolerance` 的候选数据集，按距离升序
    pub fn find_similar_datasets(
        &self,
        reference: &DatasetCell,
        candidates: &[DatasetCell],
        tolerance: f64,
    ) -> Vec<SimilarDataset> {
        let distances = self.distances_to_datasets(reference, candidates);

        let mut similar: Vec<SimilarDataset> = candidates
            .iter()
            .filter_map(|d| {
                let distance = *distances.get(&d.id)?;
                (distance <= tolerance).then_some(SimilarDataset {
                    dataset_id: d.id,
                    distance,
                })
            })
            .collect();
        similar.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        similar
    }

    /// 参考数据集到各候选数据集的全部距离（不做阈值筛选）
    ///
    /// 参考数据集没有有效晶胞、候选为空或请求失败时返回空表。
    pub fn distances_to_datasets(
        &self,
        reference: &DatasetCell,
        candidates: &[DatasetCell],
    ) -> BTreeMap<u64, f64> {
        let Some(reference_cell) = reference.primitive_cell.filter(|c| c.is_valid()) else {
            return BTreeMap::new();
        };
        let with_ids: Vec<(u64, CellParams)> = candidates
            .iter()
            .filter(|d| d.id != reference.id)
            .map(|d| (d.id, d.primitive_cell.unwrap_or_default()))
            .collect();
        if with_ids.is_empty() {
            return BTreeMap::new();
        }

        self.calculate_distances_with_ids(&reference_cell, &with_ids)
            .unwrap_or_default()
    }

    /// 待存储的相似度记录：距离不超过 `max_distance` 的全部配对，与相似阈值无关
    pub fn similarity_records_for(
        &self,
        reference: &DatasetCell,
        candidates: &[DatasetCell],
        max_distance: f64,
    ) -> Vec<SimilarityRecord> {
        let distances = self.distances_to_datasets(reference, candidates);
        similarity_records(reference.id, &distances, max_distance)
    }

    /// 所有数据集两两比较；只保留至少有一个相似项的数据集
    pub fn calculate_all_similarities(
        &self,
        datasets: &[DatasetCell],
        tolerance: f64,
    ) -> BTreeMap<u64, Vec<SimilarDataset>> {
        let mut similarities = BTreeMap::new();
        if !self.enabled() {
            return similarities;
        }

        let with_cells: Vec<&DatasetCell> =
            datasets.iter().filter(|d| d.has_primitive_cell()).collect();

        for reference in &with_cells {
            let others: Vec<DatasetCell> = with_cells
                .iter()
                .filter(|d| d.id != reference.id)
                .map(|d| (*d).clone())
                .collect();
            if others.is_empty() {
                continue;
            }

            let similar = self.find_similar_datasets(reference, &others, tolerance);
            if !similar.is_empty() {
                similarities.insert(reference.id, similar);
            }
        }

        info!(
            "{} of {} datasets have similar cells within {}",
            similarities.len(),
            with_cells.len(),
            tolerance
        );
        similarities
    }

    /// GET /health 是否成功
    pub fn api_available(&self) -> bool {
        self.transport
            .as_ref()
            .map(|t| t.get_ok(HEALTH_PATH))
            .unwrap_or(false)
    }
}

/// 把一次比较的距离转换为待存储的记录；超过 `max_distance` 的不存储
pub fn similarity_records(
    target_id: u64,
    distances: &BTreeMap<u64, f64>,
    max_distance: f64,
) -> Vec<SimilarityRecord> {
    distances
        .iter()
        .filter(|(other, distance)| **other != target_id && **distance <= max_distance)
        .map(|(&other, &distance)| SimilarityRecord {
            dataset_1_id: target_id.min(other),
            dataset_2_id: target_id.max(other),
            g6_distance: distance,
        })
        .collect()
}

fn parse_distance_response(body: &Value, sent_ids: &[u64]) -> Option<BTreeMap<u64, f64>> {
    let Some(items) = body.as_array() else {
        warn!("G6 distance API returned a non-array body: {}", body);
        return None;
    };

    let mut distances = BTreeMap::new();
    for (position, item) in items.iter().enumerate() {
        match item {
            Value::Number(n) => {
                if let (Some(id), Some(distance)) = (sent_ids.get(position), n.as_f64()) {
                    distances.insert(*id, distance);
                }
            }
            Value::Object(obj) => {
                let id = obj.get("cell_id").and_then(|v| match v {
                    Value::String(s) => s.trim().parse::<u64>().ok(),
                    other => other.as_u64(),
                });
                let distance = obj.get("g6_distance").and_then(Value::as_f64);
                if let (Some(id), Some(distance)) = (id, distance) {
                    distances.insert(id, distance);
                }
            }
            _ => debug!("Ignoring G6 result entry {}", item),
        }
    }
    Some(distances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::FakeTransport;

    fn cubic(a: f64) -> CellParams {
        CellParams::new(a, a, a, 90.0, 90.0, 90.0)
    }

    /// 距离 = |a_ref - a_cell|，按 cell_id 对象格式返回
    fn distance_by_a() -> FakeTransport {
        FakeTransport::with_handler(|_, body| {
            let reference = body["reference_cell"][0].as_f64().unwrap_or(0.0);
            let cells = body["cells"].as_object().cloned().unwrap_or_default();
            let results: Vec<Value> = cells
                .iter()
                .map(|(id, cell)| {
                    json!({"cell_id": id, "g6_distance": (cell[0].as_f64().unwrap_or(0.0) - reference).abs()})
                })
                .collect();
            Ok(Value::Array(results))
        })
    }

    #[test]
    fn test_disabled_returns_none() {
        let client: G6DistanceClient<FakeTransport> = G6DistanceClient::disabled();
        assert!(!client.enabled());
        assert!(client.calculate_distances(&cubic(10.0), &[cubic(11.0)]).is_none());
        assert!(!client.api_available());

        let settings = Settings {
            cell_api_endpoint: Some(String::new()),
            ..Settings::default()
        };
        assert!(!G6DistanceClient::from_settings(&settings).enabled());
    }

    #[test]
    fn test_invalid_reference_or_empty_comparisons() {
        let client = G6DistanceClient::with_transport(distance_by_a());

        let mut missing_a = cubic(10.0);
        missing_a.a = None;
        assert!(client.calculate_distances(&missing_a, &[cubic(11.0)]).is_none());

        let mut zero_a = cubic(10.0);
        zero_a.a = Some(0.0);
        assert!(client.calculate_distances(&zero_a, &[cubic(11.0)]).is_none());

        let mut negative_a = cubic(10.0);
        negative_a.a = Some(-5.0);
        assert!(client.calculate_distances(&negative_a, &[cubic(11.0)]).is_none());

        assert!(client.calculate_distances(&cubic(10.0), &[]).is_none());
    }

    #[test]
    fn test_request_shape() {
        let fake = FakeTransport::responding(json!([1.5]));
        let client = G6DistanceClient::with_transport(fake);
        let distances = client
            .calculate_distances_with_ids(&CellParams::new(10.0, 11.0, 12.0, 90.0, 95.0, 100.0), &[(7, cubic(9.0))])
            .unwrap();
        assert_eq!(distances.get(&7), Some(&1.5));

        let requests = client.transport.as_ref().unwrap().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, G6_DISTANCE_ENDPOINT);
        assert_eq!(requests[0].1["reference_cell"], json!([10.0, 11.0, 12.0, 90.0, 95.0, 100.0]));
        assert_eq!(requests[0].1["cells"]["7"], json!([9.0, 9.0, 9.0, 90.0, 90.0, 90.0]));
    }

    #[test]
    fn test_distances_keep_input_order() {
        let client = G6DistanceClient::with_transport(distance_by_a());
        let distances = client
            .calculate_distances(&cubic(10.0), &[cubic(13.0), cubic(10.5), cubic(10.0)])
            .unwrap();
        assert_eq!(distances, vec![Some(3.0), Some(0.5), Some(0.0)]);

        assert_eq!(client.calculate_distance(&cubic(10.0), &cubic(12.0)), Some(2.0));
    }

    #[test]
    fn test_transport_failure_is_none() {
        let client = G6DistanceClient::with_transport(FakeTransport::failing("timeout"));
        assert!(client.calculate_distances(&cubic(10.0), &[cubic(11.0)]).is_none());

        let client = G6DistanceClient::with_transport(FakeTransport::responding(json!({"error": "x"})));
        assert!(client.calculate_distances(&cubic(10.0), &[cubic(11.0)]).is_none());
    }

    #[test]
    fn test_find_similar_datasets() {
        let client = G6DistanceClient::with_transport(distance_by_a());
        let reference = DatasetCell::new(1, Some(cubic(10.0)));
        let candidates = vec![
            DatasetCell::new(2, Some(cubic(18.0))),
            DatasetCell::new(3, Some(cubic(12.0))),
            DatasetCell::new(4, None),
            DatasetCell::new(5, Some(cubic(11.0))),
        ];

        let similar = client.find_similar_datasets(&reference, &candidates, 5.0);
        let ids: Vec<u64> = similar.iter().map(|s| s.dataset_id).collect();
        assert_eq!(ids, vec![5, 3]);
        assert_eq!(similar[0].distance, 1.0);

        let no_cell = DatasetCell::new(9, None);
        assert!(client.find_similar_datasets(&no_cell, &candidates, 5.0).is_empty());
        assert!(client.find_similar_datasets(&reference, &[], 5.0).is_empty());
    }

    #[test]
    fn test_calculate_all_similarities() {
        let client = G6DistanceClient::with_transport(distance_by_a());
        let datasets = vec![
            DatasetCell::new(1, Some(cubic(10.0))),
            DatasetCell::new(2, Some(cubic(10.4))),
            DatasetCell::new(3, Some(cubic(30.0))),
            DatasetCell::new(4, None),
        ];

        let all = client.calculate_all_similarities(&datasets, 1.0);
        assert_eq!(all.len(), 2);
        assert_eq!(all[&1][0].dataset_id, 2);
        assert_eq!(all[&2][0].dataset_id, 1);
        assert!(!all.contains_key(&3));
    }

    #[test]
    fn test_positional_response_follows_sent_key_order() {
        let fake = FakeTransport::responding(json!([0.1, 0.2]));
        let client = G6DistanceClient::with_transport(fake);
        let distances = client
            .calculate_distances_with_ids(&cubic(10.0), &[(5, cubic(10.0)), (12, cubic(11.0))])
            .unwrap();
        // 键按字符串排序："12" 在 "5" 之前
        assert_eq!(distances.get(&12), Some(&0.1));
        assert_eq!(distances.get(&5), Some(&0.2));
    }

    #[test]
    fn test_similarity_records() {
        let mut distances = BTreeMap::new();
        distances.insert(3, 12.5);
        distances.insert(20, 4.0);
        distances.insert(21, 6000.0);

        let records = similarity_records(10, &distances, 5000.0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dataset_1_id, 3);
        assert_eq!(records[0].dataset_2_id, 10);
        assert_eq!(records[1].dataset_1_id, 10);
        assert_eq!(records[1].dataset_2_id, 20);
    }

    #[test]
    fn test_stored_records_are_not_limited_by_similarity_tolerance() {
        let fake = FakeTransport::responding(json!([
            {"cell_id": "2", "g6_distance": 3.0},
            {"cell_id": "3", "g6_distance": 100.0},
            {"cell_id": "4", "g6_distance": 7000.0}
        ]));
        let client = G6DistanceClient::with_transport(fake);
        let reference = DatasetCell::new(1, Some(cubic(10.0)));
        let candidates = vec![
            DatasetCell::new(2, Some(cubic(10.5))),
            DatasetCell::new(3, Some(cubic(20.0))),
            DatasetCell::new(4, Some(cubic(90.0))),
        ];

        let similar = client.find_similar_datasets(&reference, &candidates, 10.0);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].dataset_id, 2);

        let records = client.similarity_records_for(&reference, &candidates, 5000.0);
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].dataset_1_id, records[0].dataset_2_id), (1, 2));
        assert_eq!((records[1].dataset_1_id, records[1].dataset_2_id), (1, 3));
        assert_eq!(records[1].g6_distance, 100.0);
    }

    #[test]
    fn test_many_cells_map_back_to_their_ids() {
        let client = G6DistanceClient::with_transport(distance_by_a());
        let cells: Vec<CellParams> = (1..=12).map(|i| cubic(10.0 + i as f64)).collect();

        let distances = client.calculate_distances(&cubic(10.0), &cells).unwrap();
        assert_eq!(distances.len(), 12);
        assert_eq!(distances[1], Some(2.0));
        assert_eq!(distances[9], Some(10.0));
        assert_eq!(distances[11], Some(12.0));
    }

    #[test]
    fn test_many_cells_positional_response() {
        // 按请求体中 cells 的键顺序逐个返回距离
        let fake = FakeTransport::with_handler(|_, body| {
            let reference = body["reference_cell"][0].as_f64().unwrap_or(0.0);
            let cells = body["cells"].as_object().cloned().unwrap_or_default();
            let results: Vec<Value> = cells
                .values()
                .map(|cell| json!((cell[0].as_f64().unwrap_or(0.0) - reference).abs()))
                .collect();
            Ok(Value::Array(results))
        });
        let client = G6DistanceClient::with_transport(fake);
        let cells: Vec<CellParams> = (1..=11).map(|i| cubic(10.0 + i as f64)).collect();

        let distances = client.calculate_distances(&cubic(10.0), &cells).unwrap();
        assert_eq!(distances[1], Some(2.0));
        assert_eq!(distances[9], Some(10.0));
        assert_eq!(distances[10], Some(11.0));
    }

    #[test]
    fn test_api_available() {
        assert!(G6DistanceClient::with_transport(distance_by_a()).api_available());
        assert!(!G6DistanceClient::with_transport(distance_by_a().unhealthy()).api_available());
    }
}
