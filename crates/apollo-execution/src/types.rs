use crate::directive::DirectiveInstance;
use crate::schema::EnumDefinition;
use crate::schema::ExecutableSchema;
use crate::schema::InputObjectDefinition;
use crate::schema::InterfaceDefinition;
use crate::schema::ObjectDefinition;
use crate::schema::ScalarDefinition;
use crate::schema::UnionDefinition;
use apollo_compiler::ast;
use apollo_compiler::Name;
use std::fmt;

/// The type of a field, argument, input field, or variable:
/// a named type possibly wrapped in list and non-null types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(Name),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

/// A named type of an [`ExecutableSchema`]
pub enum TypeDefinition {
    Scalar(ScalarDefinition),
    Enum(EnumDefinition),
    InputObject(InputObjectDefinition),
    Object(ObjectDefinition),
    Interface(InterfaceDefinition),
    Union(UnionDefinition),
}

impl TypeRef {
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Returns whether this is a list type, nullable or not
    pub fn is_list(&self) -> bool {
        match self {
            TypeRef::Named(_) => false,
            TypeRef::List(_) => true,
            TypeRef::NonNull(inner) => inner.is_list(),
        }
    }

    pub fn is_wrapping(&self) -> bool {
        !matches!(self, TypeRef::Named(_))
    }

    /// Strips one level of non-null, if any
    pub fn nullable(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) => inner,
            _ => self,
        }
    }

    /// Removes every wrapping type
    pub fn named_type(&self) -> &Name {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }
}

impl From<&'_ ast::Type> for TypeRef {
    fn from(ty: &'_ ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => TypeRef::Named(name.clone()),
            ast::Type::NonNullNamed(name) => {
                TypeRef::NonNull(Box::new(TypeRef::Named(name.clone())))
            }
            ast::Type::List(inner) => TypeRef::List(Box::new(TypeRef::from(&**inner))),
            ast::Type::NonNullList(inner) => TypeRef::NonNull(Box::new(TypeRef::List(
                Box::new(TypeRef::from(&**inner)),
            ))),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

impl TypeDefinition {
    pub fn name(&self) -> &Name {
        match self {
            TypeDefinition::Scalar(def) => &def.name,
            TypeDefinition::Enum(def) => &def.name,
            TypeDefinition::InputObject(def) => &def.name,
            TypeDefinition::Object(def) => &def.name,
            TypeDefinition::Interface(def) => &def.name,
            TypeDefinition::Union(def) => &def.name,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TypeDefinition::Scalar(_) | TypeDefinition::Enum(_))
    }

    pub fn is_input_type(&self) -> bool {
        matches!(
            self,
            TypeDefinition::Scalar(_) | TypeDefinition::Enum(_) | TypeDefinition::InputObject(_)
        )
    }

    pub fn is_output_type(&self) -> bool {
        !matches!(self, TypeDefinition::InputObject(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeDefinition::Interface(_) | TypeDefinition::Union(_))
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            TypeDefinition::Object(_) | TypeDefinition::Interface(_) | TypeDefinition::Union(_)
        )
    }

    /// Directive instances applied to the type definition itself
    pub(crate) fn directives(&self) -> &[DirectiveInstance] {
        match self {
            TypeDefinition::Scalar(def) => &def.directives,
            TypeDefinition::Enum(def) => &def.directives,
            TypeDefinition::InputObject(def) => &def.directives,
            TypeDefinition::Object(def) => &def.directives,
            TypeDefinition::Interface(def) => &def.directives,
            TypeDefinition::Union(def) => &def.directives,
        }
    }

    pub(crate) fn directives_mut(&mut self) -> &mut Vec<DirectiveInstance> {
        match self {
            TypeDefinition::Scalar(def) => &mut def.directives,
            TypeDefinition::Enum(def) => &mut def.directives,
            TypeDefinition::InputObject(def) => &mut def.directives,
            TypeDefinition::Object(def) => &mut def.directives,
            TypeDefinition::Interface(def) => &mut def.directives,
            TypeDefinition::Union(def) => &mut def.directives,
        }
    }
}

/// Predicates on wrapped types look at the named type:
/// `[Color!]` is an input type and a leaf type if `Color` is an enum.
impl ExecutableSchema {
    fn named_definition(&self, ty: &TypeRef) -> Option<&TypeDefinition> {
        self.types.get(ty.named_type())
    }

    pub fn is_input_type(&self, ty: &TypeRef) -> bool {
        self.named_definition(ty)
            .is_some_and(TypeDefinition::is_input_type)
    }

    pub fn is_output_type(&self, ty: &TypeRef) -> bool {
        self.named_definition(ty)
            .is_some_and(TypeDefinition::is_output_type)
    }

    pub fn is_leaf_type(&self, ty: &TypeRef) -> bool {
        self.named_definition(ty).is_some_and(TypeDefinition::is_leaf)
    }

    pub fn is_abstract_type(&self, ty: &TypeRef) -> bool {
        self.named_definition(ty)
            .is_some_and(TypeDefinition::is_abstract)
    }
}
