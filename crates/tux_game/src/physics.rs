//! Rectangle physics for one jumping character and static ground.
//!
//! Dynamic bodies fall under gravity, take impulses, and are pushed out of the
//! static bodies they collide with. Resolution is axis-separable: X first,
//! then Y using the corrected X, and a body is never pushed against its own
//! direction of travel.
//!
//! Which bodies collide, and which pairs report contacts, is decided by a
//! closed category table rather than hand-written bit patterns. The table is
//! checked once at startup (`validate_categories`).

use glam::Vec2;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Player,
    Ground,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Player, Category::Ground];

    pub const fn bits(self) -> u32 {
        match self {
            Self::Player => 0b01,
            Self::Ground => 0b10,
        }
    }

    pub fn rule(self) -> &'static CategoryRule {
        match self {
            Self::Player => &CATEGORY_RULES[0],
            Self::Ground => &CATEGORY_RULES[1],
        }
    }
}

pub struct CategoryRule {
    pub category: Category,
    pub collides_with: &'static [Category],
    pub contacts_with: &'static [Category],
}

pub const CATEGORY_RULES: [CategoryRule; 2] = [
    CategoryRule {
        category: Category::Player,
        collides_with: &[Category::Ground],
        contacts_with: &[Category::Ground],
    },
    CategoryRule {
        category: Category::Ground,
        collides_with: &[Category::Player],
        contacts_with: &[],
    },
];

pub fn mask_of(categories: &[Category]) -> u32 {
    categories.iter().fold(0, |mask, c| mask | c.bits())
}

/// Every category has a non-zero bit no other category shares, and exactly
/// one rule row.
pub fn validate_categories() -> Result<(), String> {
    let mut seen_bits = 0u32;
    for category in Category::ALL {
        let bits = category.bits();
        if bits == 0 {
            return Err(format!("collision category {category:?} has no bits"));
        }
        if seen_bits & bits != 0 {
            return Err(format!(
                "collision category {category:?} overlaps another category (bits {bits:#b})"
            ));
        }
        seen_bits |= bits;

        let rows = CATEGORY_RULES
            .iter()
            .filter(|r| r.category == category)
            .count();
        if rows != 1 {
            return Err(format!(
                "collision category {category:?} has {rows} rule rows, expected 1"
            ));
        }
        if category.rule().category != category {
            return Err(format!(
                "collision category {category:?} resolves to the wrong rule row"
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn from_size(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Interiors overlap (shared edges do not count).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half + other.half;
        delta.x < reach.x && delta.y < reach.y
    }

    /// Overlapping or within `eps` of sharing an edge.
    pub fn touches(&self, other: &Aabb, eps: f32) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half + other.half + Vec2::splat(eps);
        delta.x <= reach.x && delta.y <= reach.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(usize);

#[derive(Debug, Clone)]
pub struct Body {
    pub aabb: Aabb,
    pub velocity: Vec2,
    pub mass: f32,
    pub dynamic: bool,
    pub category: Category,
    pub collision_mask: u32,
    pub contact_mask: u32,
}

impl Body {
    pub fn dynamic(category: Category, aabb: Aabb, mass: f32) -> Self {
        let rule = category.rule();
        Self {
            aabb,
            velocity: Vec2::ZERO,
            mass,
            dynamic: true,
            category,
            collision_mask: mask_of(rule.collides_with),
            contact_mask: mask_of(rule.contacts_with),
        }
    }

    pub fn fixed(category: Category, aabb: Aabb) -> Self {
        Self {
            dynamic: false,
            ..Self::dynamic(category, aabb, 0.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    pub categories: (Category, Category),
}

impl Contact {
    /// True when the pair is exactly these two categories, in either order.
    pub fn is_between(&self, first: Category, second: Category) -> bool {
        self.categories == (first, second) || self.categories == (second, first)
    }
}

const TOUCH_EPS: f32 = 0.01;

pub struct PhysicsWorld {
    gravity: Vec2,
    bodies: Vec<Body>,
    touching: HashSet<(BodyId, BodyId)>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            touching: HashSet::new(),
        }
    }

    pub fn add(&mut self, body: Body) -> BodyId {
        self.bodies.push(body);
        BodyId(self.bodies.len() - 1)
    }

    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.0]
    }

    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) {
        let body = &mut self.bodies[id.0];
        if !body.dynamic || body.mass <= 0.0 {
            log::warn!("Ignoring impulse on non-dynamic body {:?}", id);
            return;
        }
        body.velocity += impulse / body.mass;
    }

    /// Scripted placement; collision is resolved on the next step.
    pub fn set_position_x(&mut self, id: BodyId, x: f32) {
        self.bodies[id.0].aabb.center.x = x;
    }

    /// True when `id` is in contact with a static body and has no vertical
    /// velocity left after the last step.
    pub fn is_resting(&self, id: BodyId) -> bool {
        if self.bodies[id.0].velocity.y != 0.0 {
            return false;
        }
        self.touching.iter().any(|&(a, b)| {
            let other = if a == id {
                b
            } else if b == id {
                a
            } else {
                return false;
            };
            !self.bodies[other.0].dynamic
        })
    }

    /// Advance `dt` seconds. Returns the contacts that began during this step.
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        for index in 0..self.bodies.len() {
            if !self.bodies[index].dynamic {
                continue;
            }
            self.bodies[index].velocity += self.gravity * dt;
            let delta = self.bodies[index].velocity * dt;
            self.move_and_collide(index, delta);
        }
        self.collect_contacts()
    }

    fn move_and_collide(&mut self, index: usize, delta: Vec2) {
        let mut aabb = self.bodies[index].aabb;
        let collision_mask = self.bodies[index].collision_mask;
        let start = aabb.center;

        aabb.center.x += delta.x;
        for other in self.obstacles(index, collision_mask) {
            if !aabb.overlaps(&other) {
                continue;
            }
            if delta.x > 0.0 {
                aabb.center.x = (other.min().x - aabb.half.x).max(start.x);
            } else if delta.x < 0.0 {
                aabb.center.x = (other.max().x + aabb.half.x).min(start.x);
            }
        }
        let blocked_x = (aabb.center.x - (start.x + delta.x)).abs() > f32::EPSILON;

        aabb.center.y += delta.y;
        let mut blocked_y = false;
        for other in self.obstacles(index, collision_mask) {
            if !aabb.overlaps(&other) {
                continue;
            }
            if delta.y < 0.0 {
                aabb.center.y = (other.max().y + aabb.half.y).min(start.y);
                blocked_y = true;
            } else if delta.y > 0.0 {
                aabb.center.y = (other.min().y - aabb.half.y).max(start.y);
                blocked_y = true;
            }
        }

        let body = &mut self.bodies[index];
        body.aabb = aabb;
        if blocked_x {
            body.velocity.x = 0.0;
        }
        if blocked_y {
            body.velocity.y = 0.0;
        }
    }

    fn obstacles(&self, index: usize, collision_mask: u32) -> Vec<Aabb> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(i, other)| {
                *i != index && !other.dynamic && collision_mask & other.category.bits() != 0
            })
            .map(|(_, other)| other.aabb)
            .collect()
    }

    fn collect_contacts(&mut self) -> Vec<Contact> {
        let mut now_touching = HashSet::new();
        let mut began = Vec::new();

        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if !a.dynamic && !b.dynamic {
                    continue;
                }
                let reports = a.contact_mask & b.category.bits() != 0
                    || b.contact_mask & a.category.bits() != 0;
                if !reports || !a.aabb.touches(&b.aabb, TOUCH_EPS) {
                    continue;
                }
                let pair = (BodyId(i), BodyId(j));
                now_touching.insert(pair);
                if !self.touching.contains(&pair) {
                    began.push(Contact {
                        a: pair.0,
                        b: pair.1,
                        categories: (a.category, b.category),
                    });
                }
            }
        }

        self.touching = now_touching;
        began
    }
}
