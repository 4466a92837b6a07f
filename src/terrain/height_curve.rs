use serde::{Deserialize, Serialize};

/// Control point of a [`HeightCurve`]. Tangents are slopes (dvalue / dtime).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Keyframe {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Keyframe {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Keyframed remapping of raw heights, evaluated with cubic Hermite segments.
///
/// Inputs before the first key or after the last one take that key's value.
/// The curve is evaluated on worker threads, so it is plain data and cloned
/// into every mesh request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeightCurve {
    keys: Vec<Keyframe>,
}

impl HeightCurve {
    /// Keys are sorted by time; an empty list falls back to the identity curve.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        if keys.is_empty() {
            return Self::linear();
        }
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        HeightCurve { keys }
    }

    /// Identity on [0, 1].
    pub fn linear() -> Self {
        HeightCurve {
            keys: vec![
                Keyframe::with_tangents(0.0, 0.0, 1.0, 1.0),
                Keyframe::with_tangents(1.0, 1.0, 1.0, 1.0),
            ],
        }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; t > first.time guarantees index >= 1.
        let index = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[index - 1];
        let k1 = &self.keys[index];

        let dt = k1.time - k0.time;
        if dt <= f32::EPSILON {
            return k1.value;
        }

        let s = (t - k0.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::linear()
    }
}
