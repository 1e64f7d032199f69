//! In-memory resource graph built by the composer.
//!
//! Every resource is declared exactly once through [Declare::declare], which returns a typed
//! [Handle] that later declarations use to reference it. Dependencies must refer to resources
//! that were declared earlier, so the graph is acyclic by construction.

use crate::{
    balancer::LoadBalancer,
    identity::{InstanceProfile, Role},
    scaling::{AutoScalingGroup, LaunchConfiguration},
    security::SecurityGroup,
    service::{Cluster, Service},
    workload::{ContainerDefinition, TaskDefinition},
};
use serde::{Serialize, Serializer};
use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};
use tracing::debug;

/// Position of a declaration in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Id(usize);

impl Id {
    /// Returns the index of the declaration.
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed reference to a declared resource.
pub struct Handle<R> {
    id: Id,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Handle<R> {
    const fn new(id: Id) -> Self {
        Self {
            id,
            _resource: PhantomData,
        }
    }

    /// Returns the untyped identifier of the referenced resource.
    pub const fn id(&self) -> Id {
        self.id
    }
}

impl<R> Clone for Handle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Handle<R> {}

impl<R> PartialEq for Handle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<R> Eq for Handle<R> {}

impl<R> Hash for Handle<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<R: Resource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{:?}>({})", R::KIND, self.id)
    }
}

impl<R> Serialize for Handle<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}

/// A resource that can be declared in the graph.
pub trait Resource: Sized {
    /// Kind recorded alongside each declaration of this resource.
    const KIND: Kind;

    /// Wraps the resource in the untyped [Properties] stored by the graph.
    fn into_properties(self) -> Properties;

    /// Recovers a typed reference from stored [Properties], if the kind matches.
    fn from_properties(properties: &Properties) -> Option<&Self>;
}

macro_rules! resources {
    ($($kind:ident => $ty:ty),* $(,)?) => {
        /// Kind of a declared resource.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Kind {
            $($kind),*
        }

        /// Properties of a declared resource.
        #[derive(Clone, Debug, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Properties {
            $($kind($ty)),*
        }

        impl Properties {
            /// Returns the kind of the wrapped resource.
            pub const fn kind(&self) -> Kind {
                match self {
                    $(Self::$kind(_) => Kind::$kind),*
                }
            }
        }

        $(
            impl Resource for $ty {
                const KIND: Kind = Kind::$kind;

                fn into_properties(self) -> Properties {
                    Properties::$kind(self)
                }

                fn from_properties(properties: &Properties) -> Option<&Self> {
                    match properties {
                        Properties::$kind(resource) => Some(resource),
                        _ => None,
                    }
                }
            }
        )*
    };
}

resources! {
    SecurityGroup => SecurityGroup,
    LoadBalancer => LoadBalancer,
    ContainerDefinition => ContainerDefinition,
    TaskDefinition => TaskDefinition,
    Cluster => Cluster,
    Role => Role,
    InstanceProfile => InstanceProfile,
    Service => Service,
    LaunchConfiguration => LaunchConfiguration,
    AutoScalingGroup => AutoScalingGroup,
}

/// A single resource declaration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Declaration {
    pub id: Id,
    pub kind: Kind,
    pub name: String,
    pub dependencies: Vec<Id>,
    pub properties: Properties,
}

/// Interface for declaring resources.
///
/// Implementations must return a handle that refers to the newly declared resource and must
/// never be called twice for the same logical resource.
pub trait Declare {
    /// Declare a resource named `name` that depends on each of `dependencies`.
    fn declare<R: Resource>(
        &mut self,
        name: String,
        properties: R,
        dependencies: &[Id],
    ) -> Handle<R>;
}

/// Arena of declarations, stored in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Graph {
    declarations: Vec<Declaration>,
    #[serde(skip)]
    names: HashMap<String, Id>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns true if no resource has been declared.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// All declarations, in the order they were made.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Iterate over all declarations, in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Returns the declaration for `id`.
    pub fn declaration(&self, id: Id) -> Option<&Declaration> {
        self.declarations.get(id.0)
    }

    /// Returns the declaration named `name`.
    pub fn by_name(&self, name: &str) -> Option<&Declaration> {
        self.names.get(name).and_then(|id| self.declaration(*id))
    }

    /// Returns the properties of the resource referenced by `handle`.
    pub fn get<R: Resource>(&self, handle: Handle<R>) -> Option<&R> {
        self.declaration(handle.id)
            .and_then(|declaration| R::from_properties(&declaration.properties))
    }

    /// Returns the name of the resource referenced by `handle`.
    pub fn name<R>(&self, handle: Handle<R>) -> Option<&str> {
        self.declaration(handle.id)
            .map(|declaration| declaration.name.as_str())
    }

    /// Group declarations into creation waves.
    ///
    /// Every dependency of a resource appears in an earlier wave, so all resources within a
    /// wave may be created concurrently once the previous waves have completed.
    pub fn waves(&self) -> Vec<Vec<Id>> {
        let mut depths: Vec<usize> = Vec::with_capacity(self.declarations.len());
        let mut waves: Vec<Vec<Id>> = Vec::new();
        for declaration in &self.declarations {
            // Dependencies always precede their dependents, so their depth is already known
            let depth = declaration
                .dependencies
                .iter()
                .map(|dependency| depths[dependency.0] + 1)
                .max()
                .unwrap_or(0);
            depths.push(depth);
            if waves.len() <= depth {
                waves.resize_with(depth + 1, Vec::new);
            }
            waves[depth].push(declaration.id);
        }
        waves
    }
}

impl Declare for Graph {
    fn declare<R: Resource>(
        &mut self,
        name: String,
        properties: R,
        dependencies: &[Id],
    ) -> Handle<R> {
        let id = Id(self.declarations.len());
        for dependency in dependencies {
            assert!(
                *dependency < id,
                "dependency {dependency} of {name} has not been declared"
            );
        }
        assert!(
            !self.names.contains_key(&name),
            "resource {name} already declared"
        );
        debug!(id = id.0, kind = ?R::KIND, name = name.as_str(), "declared resource");
        self.names.insert(name.clone(), id);
        self.declarations.push(Declaration {
            id,
            kind: R::KIND,
            name,
            dependencies: dependencies.to_vec(),
            properties: properties.into_properties(),
        });
        Handle::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(graph: &mut Graph, name: &str, dependencies: &[Id]) -> Handle<Cluster> {
        graph.declare(name.to_string(), Cluster::default(), dependencies)
    }

    #[test]
    fn test_declare_and_lookup() {
        let mut graph = Graph::new();
        assert!(graph.is_empty());
        let a = cluster(&mut graph, "a", &[]);
        let b = cluster(&mut graph, "b", &[a.id()]);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.name(a), Some("a"));
        assert_eq!(graph.name(b), Some("b"));
        assert!(graph.get(b).is_some());
        let declaration = graph.by_name("b").unwrap();
        assert_eq!(declaration.kind, Kind::Cluster);
        assert_eq!(declaration.properties.kind(), Kind::Cluster);
        assert_eq!(declaration.dependencies, vec![a.id()]);
        assert!(graph.by_name("c").is_none());
        let names: Vec<_> = graph
            .iter()
            .map(|declaration| declaration.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_waves() {
        let mut graph = Graph::new();
        let a = cluster(&mut graph, "a", &[]);
        let b = cluster(&mut graph, "b", &[]);
        let c = cluster(&mut graph, "c", &[a.id()]);
        let d = cluster(&mut graph, "d", &[b.id(), c.id()]);
        let e = cluster(&mut graph, "e", &[a.id()]);
        assert_eq!(
            graph.waves(),
            vec![
                vec![a.id(), b.id()],
                vec![c.id(), e.id()],
                vec![d.id()]
            ]
        );
    }

    #[test]
    fn test_waves_empty() {
        assert!(Graph::new().waves().is_empty());
    }

    #[test]
    #[should_panic(expected = "already declared")]
    fn test_duplicate_name() {
        let mut graph = Graph::new();
        cluster(&mut graph, "a", &[]);
        cluster(&mut graph, "a", &[]);
    }

    #[test]
    #[should_panic(expected = "has not been declared")]
    fn test_forward_dependency() {
        let mut graph = Graph::new();
        cluster(&mut graph, "a", &[Id(1)]);
    }

    #[test]
    fn test_serialize_handle_as_id() {
        let mut graph = Graph::new();
        cluster(&mut graph, "a", &[]);
        let b = cluster(&mut graph, "b", &[]);
        assert_eq!(serde_json::to_string(&b).unwrap(), "1");
    }
}
