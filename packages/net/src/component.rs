//! # Component Model
//!
//! Typed graph entities of a Petri net.
//!
//! Places and transitions are the only *connectables*: they carry a position
//! and rectangular bounds and are the only valid arc endpoints. Arcs refer to
//! their endpoints by [`ConnectableRef`] handles rather than owning them, so
//! the container stays the single owner of every component.
//!
//! Identifiers are unique per kind, which is why every handle carries its kind.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Default width and height of a newly created place
pub const DEFAULT_PLACE_SIZE: f64 = 30.0;

/// Default width and height of a newly created transition
pub const DEFAULT_TRANSITION_SIZE: f64 = 30.0;

/// Kind tag shared by every component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Place,
    Transition,
    Arc,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Place => write!(f, "place"),
            ComponentKind::Transition => write!(f, "transition"),
            ComponentKind::Arc => write!(f, "arc"),
        }
    }
}

/// Kind tag of the components an arc may connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectableKind {
    Place,
    Transition,
}

impl From<ConnectableKind> for ComponentKind {
    fn from(kind: ConnectableKind) -> Self {
        match kind {
            ConnectableKind::Place => ComponentKind::Place,
            ConnectableKind::Transition => ComponentKind::Transition,
        }
    }
}

impl fmt::Display for ConnectableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ComponentKind::from(*self).fmt(f)
    }
}

/// Stable handle to any component in a net
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentRef {
    pub kind: ComponentKind,
    pub id: String,
}

impl ComponentRef {
    pub fn place(id: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Place,
            id: id.into(),
        }
    }

    pub fn transition(id: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Transition,
            id: id.into(),
        }
    }

    pub fn arc(id: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Arc,
            id: id.into(),
        }
    }

    /// The connectable handle for this component, if it is a place or transition
    pub fn as_connectable(&self) -> Option<ConnectableRef> {
        let kind = match self.kind {
            ComponentKind::Place => ConnectableKind::Place,
            ComponentKind::Transition => ConnectableKind::Transition,
            ComponentKind::Arc => return None,
        };
        Some(ConnectableRef {
            kind,
            id: self.id.clone(),
        })
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

/// Stable handle to a place or transition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectableRef {
    pub kind: ConnectableKind,
    pub id: String,
}

impl ConnectableRef {
    pub fn place(id: impl Into<String>) -> Self {
        Self {
            kind: ConnectableKind::Place,
            id: id.into(),
        }
    }

    pub fn transition(id: impl Into<String>) -> Self {
        Self {
            kind: ConnectableKind::Transition,
            id: id.into(),
        }
    }
}

impl From<ConnectableRef> for ComponentRef {
    fn from(r: ConnectableRef) -> Self {
        ComponentRef {
            kind: r.kind.into(),
            id: r.id,
        }
    }
}

impl From<&ConnectableRef> for ComponentRef {
    fn from(r: &ConnectableRef) -> Self {
        r.clone().into()
    }
}

impl fmt::Display for ConnectableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

/// Spatial capability shared by places and transitions
pub trait Positioned {
    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// Width and height of the hit box
    fn size(&self) -> (f64, f64);

    fn bounds(&self) -> Rect {
        let p = self.position();
        let (width, height) = self.size();
        Rect::new(p.x, p.y, width, height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Token count per token identifier
    #[serde(default)]
    pub marking: IndexMap<String, u32>,
}

impl Place {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            position,
            width: DEFAULT_PLACE_SIZE,
            height: DEFAULT_PLACE_SIZE,
            marking: IndexMap::new(),
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_marking(mut self, token: impl Into<String>, count: u32) -> Self {
        self.marking.insert(token.into(), count);
        self
    }

    /// Tokens of the given class held by this place (zero when absent)
    pub fn tokens_of(&self, token: &str) -> u32 {
        self.marking.get(token).copied().unwrap_or(0)
    }
}

impl Positioned for Place {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub timed: bool,
}

fn default_priority() -> u32 {
    1
}

impl Transition {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            position,
            width: DEFAULT_TRANSITION_SIZE,
            height: DEFAULT_TRANSITION_SIZE,
            priority: default_priority(),
            timed: false,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl Positioned for Transition {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

/// Borrowed view over a place or transition, dispatched on the tag
#[derive(Debug, Clone, Copy)]
pub enum Connectable<'a> {
    Place(&'a Place),
    Transition(&'a Transition),
}

impl<'a> Connectable<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            Connectable::Place(p) => &p.id,
            Connectable::Transition(t) => &t.id,
        }
    }

    pub fn kind(&self) -> ConnectableKind {
        match self {
            Connectable::Place(_) => ConnectableKind::Place,
            Connectable::Transition(_) => ConnectableKind::Transition,
        }
    }

    pub fn to_ref(&self) -> ConnectableRef {
        ConnectableRef {
            kind: self.kind(),
            id: self.id().to_string(),
        }
    }

    pub fn position(&self) -> Point {
        match self {
            Connectable::Place(p) => p.position(),
            Connectable::Transition(t) => t.position(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Connectable::Place(p) => p.bounds(),
            Connectable::Transition(t) => t.bounds(),
        }
    }

    /// Whether an arc may terminate on this component.
    ///
    /// Every place and transition qualifies; compatibility with a particular
    /// source is a separate question answered by [`ConnectableKind`] comparison.
    pub fn is_end_point(&self) -> bool {
        match self {
            Connectable::Place(_) | Connectable::Transition(_) => true,
        }
    }
}

/// Where an arc ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArcTarget {
    /// Bound to a real place or transition
    Connectable(ConnectableRef),
    /// Free-floating point that follows the pointer while the arc is drawn
    Temporary(Point),
}

/// Directed edge between a place and a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub id: String,
    pub source: ConnectableRef,
    pub target: ArcTarget,
    /// Weight expression per token identifier
    #[serde(default)]
    pub weights: IndexMap<String, String>,
}

impl Arc {
    pub fn new(id: impl Into<String>, source: ConnectableRef, target: ConnectableRef) -> Self {
        Self {
            id: id.into(),
            source,
            target: ArcTarget::Connectable(target),
            weights: IndexMap::new(),
        }
    }

    /// Arc whose target is still a free-floating point
    pub fn draft(id: impl Into<String>, source: ConnectableRef, at: Point) -> Self {
        Self {
            id: id.into(),
            source,
            target: ArcTarget::Temporary(at),
            weights: IndexMap::new(),
        }
    }

    pub fn with_weight(mut self, token: impl Into<String>, expression: impl Into<String>) -> Self {
        self.weights.insert(token.into(), expression.into());
        self
    }

    pub fn is_draft(&self) -> bool {
        matches!(self.target, ArcTarget::Temporary(_))
    }

    /// The bound target, `None` while the arc is a draft
    pub fn target_ref(&self) -> Option<&ConnectableRef> {
        match &self.target {
            ArcTarget::Connectable(target) => Some(target),
            ArcTarget::Temporary(_) => None,
        }
    }

    /// True when either endpoint is the given connectable
    pub fn touches(&self, connectable: &ConnectableRef) -> bool {
        self.source == *connectable || self.target_ref() == Some(connectable)
    }
}

/// Any component a net can own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Place(Place),
    Transition(Transition),
    Arc(Arc),
}

impl Component {
    pub fn id(&self) -> &str {
        match self {
            Component::Place(p) => &p.id,
            Component::Transition(t) => &t.id,
            Component::Arc(a) => &a.id,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Place(_) => ComponentKind::Place,
            Component::Transition(_) => ComponentKind::Transition,
            Component::Arc(_) => ComponentKind::Arc,
        }
    }

    pub fn component_ref(&self) -> ComponentRef {
        ComponentRef {
            kind: self.kind(),
            id: self.id().to_string(),
        }
    }
}

impl From<Place> for Component {
    fn from(place: Place) -> Self {
        Component::Place(place)
    }
}

impl From<Transition> for Component {
    fn from(transition: Transition) -> Self {
        Component::Transition(transition)
    }
}

impl From<Arc> for Component {
    fn from(arc: Arc) -> Self {
        Component::Arc(arc)
    }
}
