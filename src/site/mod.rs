//! Read-only snapshot of the scene tree consumed by the compiler.

pub mod boundary;
pub mod matching;

pub use boundary::{BoundaryKind, BoundaryMarker, BoundaryPoint, BoundarySide};
pub use matching::pair_markers;

use slotmap::SlotMap;

use crate::error::{CompileError, Result};
use crate::math::exact::is_simple_ring;
use crate::math::{ExactPoint, ExactTransform, Point2, Transform};

slotmap::new_key_type! {
    /// Unique identifier for a site in the tree.
    pub struct SiteId;
}

/// Reference to one boundary marker of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerRef {
    pub area: SiteId,
    pub index: usize,
}

impl MarkerRef {
    #[must_use]
    pub fn new(area: SiteId, index: usize) -> Self {
        Self { area, index }
    }
}

/// A room: contour plus the boundary markers placed on it.
#[derive(Debug, Clone, Default)]
pub struct Area {
    pub contour: Vec<Point2>,
    pub boundaries: Vec<BoundaryMarker>,
}

/// A symbolic link between two markers on different areas.
#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub source: MarkerRef,
    pub target: MarkerRef,
}

/// The closed set of site variants.
#[derive(Debug, Clone)]
pub enum SiteKind {
    Area(Area),
    Connection(Connection),
    Space(Vec<Point2>),
    Object(Vec<Point2>),
    Wall(Vec<Point2>),
}

/// A node of the site tree. `transform` is relative to the parent.
#[derive(Debug, Clone)]
pub struct Site {
    pub name: String,
    pub transform: Transform,
    pub kind: SiteKind,
    parent: Option<SiteId>,
    children: Vec<SiteId>,
}

impl Site {
    fn with_kind(name: impl Into<String>, kind: SiteKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn area(name: impl Into<String>, contour: Vec<Point2>, boundaries: Vec<BoundaryMarker>) -> Self {
        Self::with_kind(name, SiteKind::Area(Area { contour, boundaries }))
    }

    #[must_use]
    pub fn connection(name: impl Into<String>, source: MarkerRef, target: MarkerRef) -> Self {
        Self::with_kind(name, SiteKind::Connection(Connection { source, target }))
    }

    #[must_use]
    pub fn space(name: impl Into<String>, contour: Vec<Point2>) -> Self {
        Self::with_kind(name, SiteKind::Space(contour))
    }

    #[must_use]
    pub fn object(name: impl Into<String>, contour: Vec<Point2>) -> Self {
        Self::with_kind(name, SiteKind::Object(contour))
    }

    #[must_use]
    pub fn wall(name: impl Into<String>, contour: Vec<Point2>) -> Self {
        Self::with_kind(name, SiteKind::Wall(contour))
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Local contour, if the variant carries one.
    #[must_use]
    pub fn contour(&self) -> Option<&[Point2]> {
        match &self.kind {
            SiteKind::Area(area) => Some(&area.contour),
            SiteKind::Space(c) | SiteKind::Object(c) | SiteKind::Wall(c) => Some(c),
            SiteKind::Connection(_) => None,
        }
    }

    #[must_use]
    pub fn as_area(&self) -> Option<&Area> {
        match &self.kind {
            SiteKind::Area(area) => Some(area),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_connection(&self) -> Option<&Connection> {
        match &self.kind {
            SiteKind::Connection(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<SiteId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[SiteId] {
        &self.children
    }
}

/// Arena holding the site tree.
#[derive(Debug, Default)]
pub struct SiteTree {
    sites: SlotMap<SiteId, Site>,
    roots: Vec<SiteId>,
}

impl SiteTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, mut site: Site) -> SiteId {
        site.parent = None;
        let id = self.sites.insert(site);
        self.roots.push(id);
        id
    }

    /// Adds `site` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidSite` if `parent` does not exist.
    pub fn add_child(&mut self, parent: SiteId, mut site: Site) -> Result<SiteId> {
        if !self.sites.contains_key(parent) {
            return Err(CompileError::InvalidSite("parent site not found".into()).into());
        }
        site.parent = Some(parent);
        let id = self.sites.insert(site);
        if let Some(p) = self.sites.get_mut(parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `CompileError::InvalidSite` if the site does not exist.
    pub fn site(&self, id: SiteId) -> Result<&Site> {
        self.sites
            .get(id)
            .ok_or_else(|| CompileError::InvalidSite("site not found".into()).into())
    }

    #[must_use]
    pub fn roots(&self) -> &[SiteId] {
        &self.roots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Composes the transforms from the root down to `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if a site on the chain is missing or has a
    /// non-finite translation.
    pub fn absolute_transform(&self, id: SiteId) -> Result<ExactTransform> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(s) = current {
            let site = self.site(s)?;
            chain.push(&site.transform);
            current = site.parent;
        }
        let mut absolute = ExactTransform::identity();
        for local in chain.iter().rev() {
            absolute = absolute.then(&ExactTransform::from_transform(local)?);
        }
        Ok(absolute)
    }

    /// All sites, children before their parents, siblings in insertion
    /// order.
    #[must_use]
    pub fn post_order(&self) -> Vec<SiteId> {
        let mut out = Vec::with_capacity(self.sites.len());
        let mut stack: Vec<(SiteId, bool)> = self.roots.iter().rev().map(|&r| (r, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            let Some(site) = self.sites.get(id) else {
                continue;
            };
            stack.push((id, true));
            stack.extend(site.children.iter().rev().map(|&c| (c, false)));
        }
        out
    }

    /// Local contour of a contour-bearing site.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidSite` if the site is missing or is a
    /// connection.
    pub fn contour(&self, id: SiteId) -> Result<&[Point2]> {
        self.site(id)?
            .contour()
            .ok_or_else(|| CompileError::InvalidSite(format!("site {id:?} has no contour")).into())
    }

    /// Contour in absolute exact coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the site has no contour or a coordinate is not
    /// finite.
    pub fn absolute_contour(&self, id: SiteId) -> Result<Vec<ExactPoint>> {
        let transform = self.absolute_transform(id)?;
        self.contour(id)?
            .iter()
            .map(|p| Ok(transform.apply(&ExactPoint::from_point(p)?)))
            .collect()
    }

    /// Absolute contour with repeated points removed, or `None` if what
    /// remains is not a simple ring (empty, fewer than three distinct
    /// points, or self-intersecting).
    ///
    /// # Errors
    ///
    /// Returns an error if the site has no contour or a coordinate is not
    /// finite.
    pub fn simple_contour(&self, id: SiteId) -> Result<Option<Vec<ExactPoint>>> {
        let mut ring = self.absolute_contour(id)?;
        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        Ok(is_simple_ring(&ring).then_some(ring))
    }

    /// # Errors
    ///
    /// Returns `CompileError::InvalidSite` if the site is not an area.
    pub fn area(&self, id: SiteId) -> Result<&Area> {
        self.site(id)?
            .as_area()
            .ok_or_else(|| CompileError::InvalidSite(format!("site {id:?} is not an area")).into())
    }

    /// # Errors
    ///
    /// Returns `CompileError::InvalidSite` if the referenced site is not an
    /// area or the marker index is out of range.
    pub fn marker(&self, marker: MarkerRef) -> Result<&BoundaryMarker> {
        self.area(marker.area)?
            .boundaries
            .get(marker.index)
            .ok_or_else(|| {
                CompileError::InvalidSite(format!(
                    "marker {} out of range on {:?}",
                    marker.index, marker.area
                ))
                .into()
            })
    }

    /// Ids of every area, in post order.
    #[must_use]
    pub fn areas(&self) -> Vec<SiteId> {
        self.post_order()
            .into_iter()
            .filter(|&id| self.sites.get(id).is_some_and(|s| s.as_area().is_some()))
            .collect()
    }

    /// Ids of every connection, in post order.
    #[must_use]
    pub fn connections(&self) -> Vec<SiteId> {
        self.post_order()
            .into_iter()
            .filter(|&id| self.sites.get(id).is_some_and(|s| s.as_connection().is_some()))
            .collect()
    }
}
