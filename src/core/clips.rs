use super::mixer::ClipId;
use fnv::FnvHashMap;
use glam::Vec4;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClipRole {
    Idle,
    TransitionToFlight,
    Flap,
    TransitionToGlide,
    Glide,
    GlideFlap,
}

impl ClipRole {
    pub const ALL: [ClipRole; 6] = [
        ClipRole::Idle,
        ClipRole::TransitionToFlight,
        ClipRole::Flap,
        ClipRole::TransitionToGlide,
        ClipRole::Glide,
        ClipRole::GlideFlap,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Clip name expected in the asset for each role.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClipNames {
    pub idle: String,
    pub transition_to_flight: String,
    pub flap: String,
    pub transition_to_glide: String,
    pub glide: String,
    pub glide_flap: String,
}

impl Default for ClipNames {
    fn default() -> Self {
        Self {
            idle: "Teratorn_Idle".into(),
            transition_to_flight: "Teratorn_Transition-Flying".into(),
            flap: "Teratorn_Flapping".into(),
            transition_to_glide: "Teratorn_Transition-Gliding".into(),
            glide: "Teratorn_Gliding".into(),
            glide_flap: "Teratorn_Gliding-Flapping".into(),
        }
    }
}

impl ClipNames {
    pub fn name(&self, role: ClipRole) -> &str {
        match role {
            ClipRole::Idle => &self.idle,
            ClipRole::TransitionToFlight => &self.transition_to_flight,
            ClipRole::Flap => &self.flap,
            ClipRole::TransitionToGlide => &self.transition_to_glide,
            ClipRole::Glide => &self.glide,
            ClipRole::GlideFlap => &self.glide_flap,
        }
    }
}

/// Role → clip mapping resolved once against a loaded asset.
///
/// Roles whose name is absent from the asset stay `None`; callers must branch
/// on availability instead of assuming every role can be played.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipSet {
    slots: [Option<ClipId>; 6],
}

impl ClipSet {
    pub fn resolve<S: AsRef<str>>(available: &[S], names: &ClipNames) -> Self {
        let by_name: FnvHashMap<&str, ClipId> = available
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_ref(), i))
            .collect();
        let mut slots = [None; 6];
        for role in ClipRole::ALL {
            let name = names.name(role);
            slots[role.slot()] = by_name.get(name).copied();
            if slots[role.slot()].is_none() {
                log::warn!(
                    "[clips] no clip named {:?} for {:?}; available: {:?}",
                    name,
                    role,
                    available.iter().map(|n| n.as_ref()).collect::<Vec<_>>()
                );
            }
        }
        Self { slots }
    }

    #[inline]
    pub fn get(&self, role: ClipRole) -> Option<ClipId> {
        self.slots[role.slot()]
    }

    #[inline]
    pub fn has(&self, role: ClipRole) -> bool {
        self.get(role).is_some()
    }

    /// Reverse lookup. A clip bound to no role yields `None`.
    pub fn role_of(&self, clip: ClipId) -> Option<ClipRole> {
        ClipRole::ALL
            .into_iter()
            .find(|r| self.slots[r.slot()] == Some(clip))
    }
}

// ---------------- Keyframes ----------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackKind {
    Quaternion,
    Vector,
    Number,
    Color,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    CubicSpline,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeTrack {
    pub name: String,
    pub kind: TrackKind,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    /// Flat sample values; cubic-spline tracks store
    /// `[in_tangent, value, out_tangent]` per key.
    pub values: Vec<f32>,
    pub item_size: usize,
}

impl KeyframeTrack {
    /// True when the value buffer has the cubic-spline triplet layout.
    pub fn is_cubic_layout(&self) -> bool {
        !self.times.is_empty() && self.values.len() == self.times.len() * self.item_size * 3
    }

    /// Prepend a key at t=0 equal to the first authored key.
    ///
    /// Returns `false` when the track was left untouched (empty, or already
    /// starting at 0).
    pub fn ensure_start_key(&mut self) -> bool {
        match prepend_start_key(
            &self.times,
            &self.values,
            self.item_size,
            self.kind == TrackKind::Quaternion,
        ) {
            Some((times, values)) => {
                self.times = times;
                self.values = values;
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<KeyframeTrack>,
}

/// Give every track of every clip a key at t=0. Returns how many tracks changed.
pub fn ensure_start_keys(clips: &mut [AnimationClip]) -> usize {
    let mut patched = 0;
    for clip in clips.iter_mut() {
        for track in clip.tracks.iter_mut() {
            if track.ensure_start_key() {
                patched += 1;
            }
        }
    }
    if patched > 0 {
        log::debug!("[clips] inserted start keys into {} tracks", patched);
    }
    patched
}

/// Build new `(times, values)` buffers with a leading key at t=0.
///
/// The inserted sample copies the first key; for cubic-spline buffers the
/// whole `[in_tangent, value, out_tangent]` triplet is copied so the layout
/// stays valid. Quaternion values are renormalized.
pub fn prepend_start_key(
    times: &[f32],
    values: &[f32],
    item_size: usize,
    quaternion: bool,
) -> Option<(Vec<f32>, Vec<f32>)> {
    let first_time = *times.first()?;
    if first_time <= 0.0 || item_size == 0 {
        return None;
    }
    let cubic = values.len() == times.len() * item_size * 3;
    let sample_len = if cubic { item_size * 3 } else { item_size };
    if values.len() < sample_len {
        return None;
    }

    let mut first = values[..sample_len].to_vec();
    if quaternion && item_size == 4 {
        let base = if cubic { item_size } else { 0 };
        normalize_quat_in_place(&mut first[base..base + 4]);
    }

    let mut new_times = Vec::with_capacity(times.len() + 1);
    new_times.push(0.0);
    new_times.extend_from_slice(times);

    let mut new_values = Vec::with_capacity(values.len() + sample_len);
    new_values.extend_from_slice(&first);
    new_values.extend_from_slice(values);
    Some((new_times, new_values))
}

fn normalize_quat_in_place(q: &mut [f32]) {
    let v = Vec4::new(q[0], q[1], q[2], q[3])
        .try_normalize()
        .unwrap_or(Vec4::W);
    q.copy_from_slice(&v.to_array());
}
