use cgmath::{InnerSpace, Zero};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::graph::{
    make_graph, Dual, Graph, GraphError, KeepCloseFar, LineVertexConstraint, VertexRef,
};
use crate::util::Vec3;

pub const DEFAULT_PADDING: f64 = 1e-4;

const DEGENERATE: f64 = 1e-12;

/// How strongly each kind of violation moves the vertices involved.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Gains {
    pub close: f64,
    pub far: f64,
    /// Endpoints of a straight arc.
    pub straight_edge: f64,
    /// Vertex kept off a straight arc.
    pub straight_vertex: f64,
    /// Endpoints and center of a curved arc.
    pub curve_edge: f64,
    /// Vertex kept off a curved arc.
    pub curve_vertex: f64,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            close: 0.03,
            far: 0.03,
            straight_edge: 0.005,
            straight_vertex: 0.01,
            curve_edge: 0.00003,
            curve_vertex: 0.00009,
        }
    }
}

/// Relaxes a tiling toward tiles of unit width: same-colored tiles at least unit distance
/// apart, and every tile within unit distance across.
///
/// The primal graph and the dual it was built from are kept on the sphere of `radius`.
/// Distances are absolute, so the radius sets how many tiles fit around the sphere.
pub struct Simulation<'a> {
    dual: Dual<'a>,
    graph: Option<Graph<'a>>,
    radius: f64,
    padding: f64,
    gains: Gains,
    keep_close_fars: Vec<KeepCloseFar>,
    line_vertex_constraints: Vec<LineVertexConstraint>,
    padding_error: f64,
}

impl<'a> Simulation<'a> {
    pub fn new(dual: Dual<'a>, graph: Option<Graph<'a>>, radius: f64) -> Self {
        let (keep_close_fars, line_vertex_constraints) = match &graph {
            Some(graph) => (graph.calc_keep_close_fars(), graph.calc_line_vertex_constraints()),
            None => (Vec::new(), Vec::new()),
        };
        Self::with_constraints(dual, graph, radius, keep_close_fars, line_vertex_constraints)
    }

    /// A simulation enforcing exactly the given constraints.
    pub fn with_constraints(
        dual: Dual<'a>,
        graph: Option<Graph<'a>>,
        radius: f64,
        keep_close_fars: Vec<KeepCloseFar>,
        line_vertex_constraints: Vec<LineVertexConstraint>,
    ) -> Self {
        let mut sim = Self {
            dual,
            graph,
            radius,
            padding: DEFAULT_PADDING,
            gains: Gains::default(),
            keep_close_fars,
            line_vertex_constraints,
            padding_error: 0.0,
        };
        sim.normalize();
        sim
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_gains(mut self, gains: Gains) -> Self {
        self.gains = gains;
        self
    }

    pub fn dual(&self) -> &Dual<'a> {
        &self.dual
    }

    /// The dual, for editing. Call [`Simulation::rebuild_graph`] afterwards.
    pub fn dual_mut(&mut self) -> &mut Dual<'a> {
        &mut self.dual
    }

    pub fn graph(&self) -> Option<&Graph<'a>> {
        self.graph.as_ref()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn keep_close_fars(&self) -> &[KeepCloseFar] {
        &self.keep_close_fars
    }

    pub fn line_vertex_constraints(&self) -> &[LineVertexConstraint] {
        &self.line_vertex_constraints
    }

    /// Average padding error of the last [`Simulation::step`] call.
    pub fn padding_error(&self) -> f64 {
        self.padding_error
    }

    /// Replaces the primal graph with one built from the current dual, and its constraints.
    /// On failure the simulation keeps its previous graph.
    pub fn rebuild_graph(&mut self) -> Result<(), GraphError> {
        let graph = make_graph(&self.dual, self.radius)?;
        self.keep_close_fars = graph.calc_keep_close_fars();
        self.line_vertex_constraints = graph.calc_line_vertex_constraints();
        self.graph = Some(graph);
        self.normalize();
        Ok(())
    }

    fn normalize(&mut self) {
        self.dual.normalize(self.radius);
        if let Some(graph) = &mut self.graph {
            graph.normalize(self.radius);
        }
    }

    /// Runs `n` iterations and returns their average error.
    pub fn step(&mut self, n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        if self.graph.is_none() {
            debug!("no tiling to relax");
            self.normalize();
            self.padding_error = 0.0;
            return 0.0;
        }
        let mut total = 0.0;
        let mut padding = 0.0;
        for _ in 0..n {
            let (error, padding_error) = self.step_once();
            total += error;
            padding += padding_error;
        }
        self.padding_error = padding / n as f64;
        total / n as f64
    }

    fn step_once(&mut self) -> (f64, f64) {
        let Some(graph) = self.graph.as_mut() else {
            return (0.0, 0.0);
        };
        let mut pass = Iteration::new(graph);
        for &constraint in &self.keep_close_fars {
            pass.keep_close_far(constraint, self.padding, &self.gains);
        }
        for &constraint in &self.line_vertex_constraints {
            if constraint.curve.is_none() {
                pass.straight_line_vertex(constraint, self.radius, self.padding, &self.gains);
            }
        }
        for &constraint in &self.line_vertex_constraints {
            if let Some(center) = constraint.curve {
                pass.curved_line_vertex(constraint, center, self.padding, &self.gains);
            }
        }
        let Iteration {
            velocity,
            total,
            padding_error,
            ..
        } = pass;
        for (index, v) in velocity.into_iter().enumerate() {
            if !graph.is_axis_fixed(index) {
                graph.nudge(index, v);
            }
        }
        self.normalize();
        (total, padding_error)
    }
}

/// Velocity and error accumulated over one pass through the constraints.
struct Iteration<'g, 'a> {
    graph: &'g Graph<'a>,
    velocity: Vec<Vec3>,
    total: f64,
    padding_error: f64,
}

impl<'g, 'a> Iteration<'g, 'a> {
    fn new(graph: &'g Graph<'a>) -> Self {
        Self {
            graph,
            velocity: vec![Vec3::zero(); graph.vertices().len()],
            total: 0.0,
            padding_error: 0.0,
        }
    }

    /// Adds `w * factor`, given in world coordinates, to the velocity of the stored vertex.
    fn push(&mut self, r: VertexRef, w: Vec3, factor: f64) {
        let ctx = self.graph.ctx();
        self.velocity[r.index] += ctx.transform(ctx.inverse(r.element), w) * factor;
    }

    fn keep_close_far(&mut self, c: KeepCloseFar, padding: f64, gains: &Gains) {
        let pa = self.graph.pos_of(c.a);
        let pb = self.graph.pos_of(c.b);
        let d = (pa - pb).magnitude();
        let pad = if c.keep_close && c.keep_far { 0.0 } else { padding };
        if c.keep_close && d >= 1.0 - pad {
            let excess = d - (1.0 - pad);
            self.push(c.a, pb - pa, excess * gains.close);
            self.push(c.b, pa - pb, excess * gains.close);
            self.total += (d - 1.0).max(0.0);
            self.padding_error += excess;
        }
        if c.keep_far && d <= 1.0 + pad {
            let deficit = (1.0 + pad) - d;
            if d > DEGENERATE {
                self.push(c.a, (pa - pb).normalize(), deficit * gains.far);
                self.push(c.b, (pb - pa).normalize(), deficit * gains.far);
            }
            self.total += (1.0 - d).max(0.0);
            self.padding_error += deficit;
        }
    }

    /// Keeps `b` off the great-circle arc between `a0` and `a1`.
    fn straight_line_vertex(
        &mut self,
        c: LineVertexConstraint,
        radius: f64,
        pad: f64,
        gains: &Gains,
    ) {
        let a0 = self.graph.pos_of(c.a0);
        let a1 = self.graph.pos_of(c.a1);
        let b = self.graph.pos_of(c.b);
        let r2 = radius * radius;
        let dot = a0.dot(a1);
        let den = r2 * r2 - dot * dot;
        if den.abs() < DEGENERATE {
            return;
        }
        let x = (b.dot(a0) * r2 - b.dot(a1) * dot) / den;
        let y = (b.dot(a1) * r2 - b.dot(a0) * dot) / den;
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return;
        }
        let q = a0 * x + a1 * y;
        if q.magnitude() < DEGENERATE {
            return;
        }
        let q = q.normalize() * radius;
        let d = (q - b).magnitude();
        if d >= 1.0 + pad || d < DEGENERATE {
            return;
        }
        let away = (q - b).normalize();
        let k = (1.0 + pad) - d;
        self.push(c.a0, away, k * gains.straight_edge);
        self.push(c.a1, away, k * gains.straight_edge);
        self.push(c.b, away, -k * gains.straight_vertex);
        self.total += (1.0 - d).max(0.0);
        self.padding_error += k;
    }

    /// Keeps `b` off the unit arc around `center` between `a0` and `a1`.
    fn curved_line_vertex(
        &mut self,
        c: LineVertexConstraint,
        center: VertexRef,
        pad: f64,
        gains: &Gains,
    ) {
        let origin = self.graph.pos_of(center);
        let b = self.graph.pos_of(c.b) - origin;
        if b.magnitude2() >= (2.0 + pad) * (2.0 + pad) {
            return;
        }
        let a0 = self.graph.pos_of(c.a0) - origin;
        let a1 = self.graph.pos_of(c.a1) - origin;
        if a0.magnitude() < DEGENERATE || a1.magnitude() < DEGENERATE {
            return;
        }
        let (a0, a1) = (a0.normalize(), a1.normalize());
        let dot = a0.dot(a1);
        let den = 1.0 - dot * dot;
        if den.abs() < DEGENERATE {
            return;
        }
        let x = (b.dot(a0) - b.dot(a1) * dot) / den;
        let y = (b.dot(a1) - b.dot(a0) * dot) / den;
        if x < 0.0 || y < 0.0 {
            return;
        }
        let q = a0 * x + a1 * y;
        if q.magnitude() < DEGENERATE {
            return;
        }
        let q = q.normalize();
        let d = (q - b).magnitude();
        if d >= 1.0 + pad || d < DEGENERATE {
            return;
        }
        let away = (q - b).normalize();
        let k = (1.0 + pad) - d;
        self.push(center, away, k * gains.curve_edge);
        self.push(c.a0, away, k * gains.curve_edge);
        self.push(c.a1, away, k * gains.curve_edge);
        self.push(c.b, away, -k * gains.curve_vertex);
        self.total += (1.0 - d).max(0.0);
        self.padding_error += k;
    }
}
