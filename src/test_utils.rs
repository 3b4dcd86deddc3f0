// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities.

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};

use ndarray::Array2;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

use crate::dims::Dims;
use crate::qobj::Qobj;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Pauli X, without cached predicates.
pub fn sigma_x() -> Qobj {
    Qobj::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap()
}

/// Pauli Y, without cached predicates.
pub fn sigma_y() -> Qobj {
    Qobj::new(vec![
        vec![c(0.0, 0.0), c(0.0, -1.0)],
        vec![c(0.0, 1.0), c(0.0, 0.0)],
    ])
    .unwrap()
}

/// Pauli Z, without cached predicates.
pub fn sigma_z() -> Qobj {
    Qobj::new(vec![vec![1.0, 0.0], vec![0.0, -1.0]]).unwrap()
}

/// Basis ket `|i⟩` of an `n`-level space.
pub fn basis(n: usize, i: usize) -> Qobj {
    let mut v = vec![0.0; n];
    v[i] = 1.0;
    Qobj::builder(v).dims(Dims::ket(&[n])).build().unwrap()
}

/// Reproducible random Hermitian operator with entries of order one.
pub fn random_hermitian(n: usize, seed: u64) -> Qobj {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = Array2::from_shape_fn((n, n), |_| {
        c(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    });
    let h = (&a + &a.t().mapv(|v| v.conj())).mapv(|v| v * 0.5);
    Qobj::builder(h).dims(Dims::oper(&[n])).build().unwrap()
}

/// Assert equal dims and elementwise agreement within `tol`.
pub fn assert_qobj_close(actual: &Qobj, expected: &Qobj, tol: f64) {
    assert_eq!(actual.dims(), expected.dims(), "dims differ");
    let a = actual.full();
    let b = expected.full();
    let worst = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max);
    assert!(
        worst <= tol,
        "max elementwise difference {:e} exceeds {:e}\nactual:\n{}\nexpected:\n{}",
        worst,
        tol,
        actual,
        expected
    );
}

/// Run `f` and collect the WARN and ERROR events it logs on this thread.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(WarningCollector {
        events: Arc::clone(&events),
    });
    let out = tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    (out, captured)
}

struct WarningCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S: Subscriber> Layer<S> for WarningCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() > Level::WARN {
            return;
        }
        let mut line = EventLine::default();
        event.record(&mut line);
        self.events.lock().unwrap().push(line.0);
    }
}

#[derive(Default)]
struct EventLine(String);

impl Visit for EventLine {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        if field.name() == "message" {
            let _ = write!(self.0, "{:?}", value);
        } else {
            let _ = write!(self.0, "{}={:?}", field.name(), value);
        }
    }
}
