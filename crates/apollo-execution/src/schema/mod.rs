//! The executable schema: type definitions baked once with their resolvers,
//! scalar implementations, and directive instances.

use crate::directive::Directive;
use crate::directive::DirectiveInstance;
use crate::resolver::Resolver;
use crate::resolver::TypeResolver;
use crate::scalar::Scalar;
use crate::types::TypeDefinition;
use crate::types::TypeRef;
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use indexmap::IndexMap;
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

mod builder;

pub use self::builder::SchemaBuilder;

/// A schema ready for execution, built with [`ExecutableSchema::builder`].
///
/// Types are stored in an arena keyed by name and refer to each other by name.
/// Nothing changes after [`SchemaBuilder::build`], so the same schema can serve
/// any number of concurrent requests.
pub struct ExecutableSchema {
    pub(crate) schema: Valid<Schema>,
    pub(crate) types: IndexMap<Name, TypeDefinition>,
    pub(crate) directive_definitions: IndexMap<Name, DirectiveDefinition>,
}

pub struct ScalarDefinition {
    pub(crate) name: Name,
    pub(crate) implementation: Arc<dyn Scalar>,
    pub(crate) directives: Vec<DirectiveInstance>,
}

pub struct EnumDefinition {
    pub(crate) name: Name,
    pub(crate) values: IndexMap<Name, EnumValueDefinition>,
    pub(crate) directives: Vec<DirectiveInstance>,
}

pub struct EnumValueDefinition {
    pub(crate) name: Name,
    pub(crate) directives: Vec<DirectiveInstance>,
}

pub struct InputObjectDefinition {
    pub(crate) name: Name,
    pub(crate) fields: IndexMap<Name, InputValueDefinition>,
    pub(crate) directives: Vec<DirectiveInstance>,
}

/// An argument of a field or directive, or a field of an input object type
pub struct InputValueDefinition {
    pub(crate) name: Name,
    pub(crate) ty: TypeRef,
    pub(crate) default_value: Option<Node<ast::Value>>,
    pub(crate) directives: Vec<DirectiveInstance>,
}

pub struct ObjectDefinition {
    pub(crate) name: Name,
    pub(crate) fields: IndexMap<Name, FieldDefinition>,
    pub(crate) interfaces: IndexSet<Name>,
    pub(crate) directives: Vec<DirectiveInstance>,
}

/// A field of an object type, with its resolver
pub struct FieldDefinition {
    pub(crate) name: Name,
    pub(crate) ty: TypeRef,
    pub(crate) arguments: IndexMap<Name, InputValueDefinition>,
    /// Applied around the resolver, outermost first
    pub(crate) directives: Vec<DirectiveInstance>,
    pub(crate) resolver: Arc<dyn Resolver>,
    pub(crate) type_resolver: Option<Arc<dyn TypeResolver>>,
}

pub struct InterfaceDefinition {
    pub(crate) name: Name,
    /// Object types implementing this interface, directly or not
    pub(crate) possible_types: IndexSet<Name>,
    pub(crate) directives: Vec<DirectiveInstance>,
}

pub struct UnionDefinition {
    pub(crate) name: Name,
    pub(crate) members: IndexSet<Name>,
    pub(crate) directives: Vec<DirectiveInstance>,
}

pub struct DirectiveDefinition {
    pub(crate) name: Name,
    pub(crate) arguments: IndexMap<Name, InputValueDefinition>,
    /// `None` for directives declared in the schema without a registered implementation
    pub(crate) implementation: Option<Arc<dyn Directive>>,
}

impl ExecutableSchema {
    /// Starts configuring resolvers, scalars, and directives for `schema`
    pub fn builder(schema: Valid<Schema>) -> SchemaBuilder {
        SchemaBuilder::new(schema)
    }

    /// The schema this was built from
    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    /// Every named type, in schema order
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn get_object(&self, name: &str) -> Option<&ObjectDefinition> {
        match self.types.get(name)? {
            TypeDefinition::Object(def) => Some(def),
            _ => None,
        }
    }

    pub fn directive_definition(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directive_definitions.get(name)
    }

    /// Looks up a field by its coordinate, such as `Query.user`
    pub fn get_field_by_name(&self, coordinate: &str) -> Option<&FieldDefinition> {
        let (type_name, field_name) = coordinate.split_once('.')?;
        self.get_object(type_name)?.fields.get(field_name)
    }

    /// Returns whether `object` is an object type that may be returned
    /// for a field of the abstract type `abstract_type`
    pub fn is_possible_type(&self, abstract_type: &str, object: &str) -> bool {
        match self.types.get(abstract_type) {
            Some(TypeDefinition::Interface(def)) => def.possible_types.contains(object),
            Some(TypeDefinition::Union(def)) => def.members.contains(object),
            _ => false,
        }
    }
}

impl fmt::Debug for ExecutableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableSchema")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field(
                "directive_definitions",
                &self.directive_definitions.keys().collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ScalarDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }
}

impl EnumDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn values(&self) -> impl Iterator<Item = &EnumValueDefinition> {
        self.values.values()
    }
}

impl EnumValueDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }
}

impl InputObjectDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&InputValueDefinition> {
        self.fields.get(name)
    }
}

impl InputValueDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn default_value(&self) -> Option<&Node<ast::Value>> {
        self.default_value.as_ref()
    }
}

impl ObjectDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.contains(interface)
    }
}

impl FieldDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.get(name)
    }
}

impl InterfaceDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn possible_types(&self) -> impl Iterator<Item = &Name> {
        self.possible_types.iter()
    }
}

impl UnionDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn members(&self) -> impl Iterator<Item = &Name> {
        self.members.iter()
    }
}

impl DirectiveDefinition {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn is_implemented(&self) -> bool {
        self.implementation.is_some()
    }
}
