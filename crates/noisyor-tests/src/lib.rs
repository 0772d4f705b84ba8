//! Shared fixtures for the noisyor integration tests.
//!
//! - [`earthquake`]: the burglar/earthquake alarm network
//! - [`diagnosis`]: environment -> disease -> symptom network with a joint
//!   "all symptoms" event

use noisyor_core::{Assignment, BayesNet, EventId, Probability};

/// Parses a probability literal; panics on malformed fixtures.
pub fn p(text: &str) -> Probability {
    Probability::from_decimal_str(text).expect("probability literal")
}

/// Builds an assignment; panics on contradictory fixtures.
pub fn given(pairs: &[(EventId, bool)]) -> Assignment {
    Assignment::from_pairs(pairs.iter().copied()).expect("consistent assignment")
}

pub fn assert_close(actual: f64, expected: f64, tol: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{} mismatch: expected {:.15}, got {:.15}, diff={:.3e}",
        label,
        expected,
        actual,
        (actual - expected).abs()
    );
}

/// Burglar/earthquake alarm network.
pub struct Earthquake {
    pub net: BayesNet,
    pub earthquake: EventId,
    pub burglar: EventId,
    pub radio: EventId,
    pub alarm: EventId,
    pub phonecall: EventId,
}

/// Baseline of the alarm (`f`).
pub const ALARM_BASELINE: &str = "0.001";
/// Burglar's weight on the alarm.
pub const ALPHA_BURGLAR: &str = "0.99";
/// Earthquake's weight on the alarm.
pub const ALPHA_EARTHQUAKE: &str = "0.01";

pub fn earthquake() -> Earthquake {
    let mut net = BayesNet::new();
    let earthquake = net
        .add_root_event("Earthquake", p("0.001"))
        .expect("Earthquake");
    let burglar = net.add_root_event("Burglar", p("0.001")).expect("Burglar");
    let radio = net
        .add_event("Radio", p("0"), [(earthquake, p("1"))])
        .expect("Radio");
    let alarm = net
        .add_event(
            "Alarm",
            p(ALARM_BASELINE),
            [(burglar, p(ALPHA_BURGLAR)), (earthquake, p(ALPHA_EARTHQUAKE))],
        )
        .expect("Alarm");
    let phonecall = net
        .add_event("Phonecall", p("0"), [(alarm, p("1"))])
        .expect("Phonecall");
    Earthquake {
        net,
        earthquake,
        burglar,
        radio,
        alarm,
        phonecall,
    }
}

/// Environment -> disease -> symptom network.
pub struct Diagnosis {
    pub net: BayesNet,
    pub cold: EventId,
    pub hospital: EventId,
    pub smoker: EventId,
    pub flu: EventId,
    pub tb: EventId,
    pub cancer: EventId,
    pub cough: EventId,
    pub fever: EventId,
    pub breathing: EventId,
    /// Cough, fever and breathing difficulty together.
    pub symptoms: EventId,
}

pub fn diagnosis() -> Diagnosis {
    let mut net = BayesNet::new();
    let cold = net.add_root_event("Cold", p("0.2")).expect("Cold");
    let hospital = net.add_root_event("Hospital", p("0.01")).expect("Hospital");
    let smoker = net.add_root_event("Smoker", p("0.3")).expect("Smoker");

    let flu = net
        .add_event("Flu", p("0.2"), [(cold, p("0.1")), (hospital, p("0.2"))])
        .expect("Flu");
    let tb = net
        .add_event("TB", p("0.005"), [(hospital, p("0.01"))])
        .expect("TB");
    let cancer = net
        .add_event("Cancer", p("0.01"), [(smoker, p("0.05"))])
        .expect("Cancer");

    let cough = net
        .add_event(
            "Cough",
            p("0"),
            [(flu, p("0.5")), (tb, p("0.7")), (cancer, p("0.3"))],
        )
        .expect("Cough");
    let fever = net
        .add_event("Fever", p("0"), [(flu, p("0.3")), (tb, p("0.2"))])
        .expect("Fever");
    let breathing = net
        .add_event("Breathing", p("0"), [(tb, p("0.5")), (cancer, p("0.4"))])
        .expect("Breathing");

    let symptoms = net
        .add_joint_event("Symptoms", [cough, fever, breathing])
        .expect("Symptoms");

    Diagnosis {
        net,
        cold,
        hospital,
        smoker,
        flu,
        tb,
        cancer,
        cough,
        fever,
        breathing,
        symptoms,
    }
}

/// JSON form of [`diagnosis`], with its queries.
pub const DIAGNOSIS_JSON: &str = include_str!("../../../networks/diagnosis.json");

/// JSON form of [`earthquake`], with its queries.
pub const EARTHQUAKE_JSON: &str = include_str!("../../../networks/earthquake.json");
