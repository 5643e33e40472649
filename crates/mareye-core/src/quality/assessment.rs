use std::fmt;

use serde::Serialize;

use super::Metrics;

/// Categorical grading of a metrics record, as shown on analytics reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QualityAssessment {
    pub psnr: PsnrGrade,
    pub ssim: SimilarityGrade,
    pub uiqm: ImprovementGrade,
    pub overall: Verdict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PsnrGrade {
    Good,
    Moderate,
    Poor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SimilarityGrade {
    #[serde(rename = "High similarity")]
    High,
    #[serde(rename = "Moderate similarity")]
    Moderate,
    #[serde(rename = "Low similarity")]
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ImprovementGrade {
    #[serde(rename = "Significantly improved")]
    SignificantlyImproved,
    Improved,
    #[serde(rename = "No improvement")]
    NoImprovement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "Enhancement successful")]
    Successful,
    #[serde(rename = "Enhancement failed")]
    Failed,
}

impl QualityAssessment {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let psnr = if metrics.psnr() > 20.0 {
            PsnrGrade::Good
        } else if metrics.psnr() > 15.0 {
            PsnrGrade::Moderate
        } else {
            PsnrGrade::Poor
        };

        let ssim = if metrics.ssim() > 0.8 {
            SimilarityGrade::High
        } else if metrics.ssim() > 0.6 {
            SimilarityGrade::Moderate
        } else {
            SimilarityGrade::Low
        };

        let improvement = metrics.uiqm_improvement();
        let uiqm = if improvement > 50.0 {
            ImprovementGrade::SignificantlyImproved
        } else if improvement > 0.0 {
            ImprovementGrade::Improved
        } else {
            ImprovementGrade::NoImprovement
        };

        let overall = if improvement > 0.0 {
            Verdict::Successful
        } else {
            Verdict::Failed
        };

        Self {
            psnr,
            ssim,
            uiqm,
            overall,
        }
    }
}

impl fmt::Display for PsnrGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "Good"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Poor => write!(f, "Poor"),
        }
    }
}

impl fmt::Display for SimilarityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High similarity"),
            Self::Moderate => write!(f, "Moderate similarity"),
            Self::Low => write!(f, "Low similarity"),
        }
    }
}

impl fmt::Display for ImprovementGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignificantlyImproved => write!(f, "Significantly improved"),
            Self::Improved => write!(f, "Improved"),
            Self::NoImprovement => write!(f, "No improvement"),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Successful => write!(f, "Enhancement successful"),
            Self::Failed => write!(f, "Enhancement failed"),
        }
    }
}
