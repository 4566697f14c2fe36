//! Biomarker accessors. A biomarker is any node carrying a detection
//! timeline; every accessor returns nodes earliest-detectable first.

use crate::graph::Network;
use crate::model::{AtnCategory, DetectionMethod, DetectionTimeline, Node};

impl Network {
    /// All biomarkers sorted by years before symptom onset, descending.
    /// Ties break on node id.
    pub fn biomarkers_by_timeline(&self) -> Vec<&Node> {
        let mut markers: Vec<(&Node, &DetectionTimeline)> = self
            .nodes()
            .iter()
            .filter_map(|n| n.detection_timeline.as_ref().map(|t| (n, t)))
            .collect();
        markers.sort_by(|(a, ta), (b, tb)| {
            tb.years_before_symptoms
                .total_cmp(&ta.years_before_symptoms)
                .then_with(|| a.id.cmp(&b.id))
        });
        markers.into_iter().map(|(n, _)| n).collect()
    }

    pub fn biomarkers_by_atn(&self, category: AtnCategory) -> Vec<&Node> {
        self.biomarkers_where(|t| t.atn_category == category)
    }

    pub fn biomarkers_by_method(&self, method: DetectionMethod) -> Vec<&Node> {
        self.biomarkers_where(|t| t.method == method)
    }

    pub fn commercial_biomarkers(&self) -> Vec<&Node> {
        self.biomarkers_where(|t| t.commercially_available)
    }

    /// Biomarkers awaiting regulatory clearance (pending or breakthrough).
    pub fn pending_biomarkers(&self) -> Vec<&Node> {
        self.biomarkers_where(|t| t.regulatory_status.is_pending())
    }

    /// Biomarkers already abnormal `years` before symptom onset. Smaller
    /// values of `years` return a superset of larger ones.
    pub fn biomarkers_detectable_at(&self, years: f64) -> Vec<&Node> {
        self.biomarkers_where(|t| t.years_before_symptoms >= years)
    }

    fn biomarkers_where(&self, keep: impl Fn(&DetectionTimeline) -> bool) -> Vec<&Node> {
        self.biomarkers_by_timeline()
            .into_iter()
            .filter(|n| n.detection_timeline.as_ref().is_some_and(&keep))
            .collect()
    }
}
