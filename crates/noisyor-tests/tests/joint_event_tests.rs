//! Joint events: conjunctions queried like a single event.

use noisyor_core::{Assignment, BayesNet, EventId, ExecError, FullConfigModel, StructureViolation};
use noisyor_tests::{given, p};

/// A -> B, A -> C, D -> E; B and C share their only influence.
struct Shared {
    net: BayesNet,
    a: EventId,
    b: EventId,
    c: EventId,
    d: EventId,
    e: EventId,
}

fn shared() -> Shared {
    let mut net = BayesNet::new();
    let a = net.add_root_event("A", p("0.3")).expect("A");
    let b = net.add_event("B", p("0.1"), [(a, p("0.4"))]).expect("B");
    let c = net.add_event("C", p("0.2"), [(a, p("0.6"))]).expect("C");
    let d = net.add_root_event("D", p("0.5")).expect("D");
    let e = net.add_event("E", p("0.25"), [(d, p("0.5"))]).expect("E");
    Shared { net, a, b, c, d, e }
}

#[test]
fn single_member_joint_matches_its_member() {
    let s = shared();
    let mut net = s.net;
    let solo = net.add_joint_event("OnlyB", [s.b]).expect("joint");

    for assignment in [
        Assignment::new(),
        given(&[(s.a, true)]),
        given(&[(s.a, false)]),
    ] {
        assert_eq!(
            net.probability_true_exact(solo, &assignment).expect("joint"),
            net.probability_true_exact(s.b, &assignment).expect("member")
        );
    }
}

#[test]
fn shared_influence_is_summed_once() {
    // P(B ∧ C) = Σ_a P(B | a) P(C | a) P(a)
    //          = 0.46 * 0.68 * 0.3 + 0.1 * 0.2 * 0.7 = 0.10784
    let s = shared();
    let mut net = s.net;
    let bc = net.add_joint_event("BC", [s.b, s.c]).expect("joint");

    assert_eq!(FullConfigModel::influences(net.joint(bc).expect("joint")), &[s.a]);
    assert_eq!(
        net.probability_true_exact(bc, &Assignment::new()).expect("P(BC)"),
        p("0.10784")
    );
    assert_eq!(
        net.probability_true_exact(bc, &given(&[(s.a, true)])).expect("P(BC | A)"),
        p("0.3128")
    );
    assert_eq!(
        net.probability_false_exact(bc, &given(&[(s.a, false)])).expect("P(¬BC | ¬A)"),
        p("0.98")
    );
}

#[test]
fn independent_members_multiply() {
    let s = shared();
    let mut net = s.net;
    let be = net.add_joint_event("BE", [s.b, s.e]).expect("joint");
    let none = Assignment::new();

    let p_b = net.probability_true_exact(s.b, &none).expect("P(B)").into_ratio();
    let p_e = net.probability_true_exact(s.e, &none).expect("P(E)").into_ratio();
    assert_eq!(
        net.probability_true_exact(be, &none).expect("P(BE)").into_ratio(),
        p_b * p_e
    );
    assert_eq!(
        FullConfigModel::influences(net.joint(be).expect("joint")),
        &[s.a, s.d]
    );
}

#[test]
fn joints_nest() {
    let s = shared();
    let mut net = s.net;
    let bc = net.add_joint_event("BC", [s.b, s.c]).expect("BC");
    let bce = net.add_joint_event("BC_E", [bc, s.e]).expect("BC_E");
    let flat = net.add_joint_event("BCE", [s.b, s.c, s.e]).expect("BCE");
    let none = Assignment::new();

    let nested = net.probability_true_exact(bce, &none).expect("nested");
    assert_eq!(nested, net.probability_true_exact(flat, &none).expect("flat"));

    let p_bc = net.probability_true_exact(bc, &none).expect("P(BC)").into_ratio();
    let p_e = net.probability_true_exact(s.e, &none).expect("P(E)").into_ratio();
    assert_eq!(nested.into_ratio(), p_bc * p_e);
}

#[test]
fn joint_can_influence_a_binary_event() {
    // P(X) = 0.5 * P(BC) with a zero baseline.
    let s = shared();
    let mut net = s.net;
    let bc = net.add_joint_event("BC", [s.b, s.c]).expect("BC");
    let x = net.add_event("X", p("0"), [(bc, p("0.5"))]).expect("X");

    assert_eq!(
        net.probability_true_exact(x, &Assignment::new()).expect("P(X)"),
        p("0.05392")
    );
    assert_eq!(
        net.probability_true_exact(x, &given(&[(bc, true)])).expect("P(X | BC)"),
        p("0.5")
    );
}

#[test]
fn joint_success_is_the_product_for_every_full_config() {
    let s = shared();
    let mut net = s.net;
    let be = net.add_joint_event("BE", [s.b, s.e]).expect("joint");
    let influences = FullConfigModel::influences(net.joint(be).expect("joint")).to_vec();

    for mask in 0..(1_u32 << influences.len()) {
        let true_events: Vec<EventId> = influences
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, &id)| id)
            .collect();
        let joint = net.success_given_full_config(be, &true_events).expect("joint");
        let b = net.success_given_full_config(s.b, &true_events).expect("B");
        let e = net.success_given_full_config(s.e, &true_events).expect("E");
        assert_eq!(joint.into_ratio(), b.into_ratio() * e.into_ratio(), "mask {:b}", mask);
    }
}

#[test]
fn malformed_joints_are_rejected() {
    let s = shared();
    let mut net = s.net;
    assert!(matches!(
        net.add_joint_event("Empty", std::iter::empty()),
        Err(ExecError::ValidationError(_))
    ));
    assert!(matches!(
        net.add_joint_event("Dangling", [s.b, EventId(99)]),
        Err(ExecError::ValidationError(_))
    ));
    assert_eq!(net.len(), 5);
}

#[test]
fn member_edges_are_reported_not_refused() {
    let s = shared();
    let mut net = s.net;
    let ab = net.add_joint_event("AB", [s.a, s.b]).expect("construction allows it");
    let violations = net.structure_violations();
    assert_eq!(violations.len(), 1);
    assert!(net.check_structure().is_err());
    assert!(violations[0].describe(&net).contains("AB"));
    assert!(net.probability_true(ab, &Assignment::new()).is_ok());
}

#[test]
fn edges_between_influences_of_different_members_are_reported() {
    let mut net = BayesNet::new();
    let a = net.add_root_event("A", p("0.5")).expect("A");
    let b = net.add_event("B", p("0"), [(a, p("1"))]).expect("B");
    let x = net.add_event("X", p("0"), [(a, p("1"))]).expect("X");
    let y = net.add_event("Y", p("0"), [(b, p("1"))]).expect("Y");
    let xy = net.add_joint_event("XY", [x, y]).expect("joint");

    assert_eq!(
        net.structure_violations(),
        vec![StructureViolation::SiblingEdge {
            event: xy,
            upstream: a,
            downstream: b,
        }]
    );
    assert!(net.check_structure().is_err());
}
