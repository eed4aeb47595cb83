use super::DirectiveDefinition;
use super::EnumDefinition;
use super::EnumValueDefinition;
use super::ExecutableSchema;
use super::FieldDefinition;
use super::InputObjectDefinition;
use super::InputValueDefinition;
use super::InterfaceDefinition;
use super::ObjectDefinition;
use super::ScalarDefinition;
use super::UnionDefinition;
use crate::coercion::arguments::coerce_arguments;
use crate::coercion::CoercionContext;
use crate::directive::ArgumentParent;
use crate::directive::Directive;
use crate::directive::DirectiveInstance;
use crate::error::BuildError;
use crate::resolver::DefaultResolver;
use crate::resolver::ResolveInfo;
use crate::resolver::Resolver;
use crate::resolver::TypeResolver;
use crate::resolver::UserContext;
use crate::scalar;
use crate::scalar::Scalar;
use crate::types::TypeDefinition;
use crate::types::TypeRef;
use crate::JsonValue;
use apollo_compiler::ast;
use apollo_compiler::schema;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use indexmap::IndexMap;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registers implementations for a schema, then [bakes](Self::build) it
/// into an [`ExecutableSchema`].
///
/// ```
/// use apollo_compiler::Schema;
/// use apollo_execution::resolver_fn;
/// use apollo_execution::ExecutableSchema;
/// use apollo_execution::JsonValue;
///
/// let sdl = "type Query { hello: String }";
/// let schema = Schema::parse_and_validate(sdl, "schema.graphql").unwrap();
/// let schema = ExecutableSchema::builder(schema)
///     .resolver(
///         "Query.hello",
///         resolver_fn(|_, _, _, _| Ok(JsonValue::from("world"))),
///     )
///     .build()
///     .unwrap();
/// # let _ = schema;
/// ```
pub struct SchemaBuilder {
    schema: Valid<Schema>,
    resolvers: Vec<(String, Arc<dyn Resolver>)>,
    type_resolvers: Vec<(String, Arc<dyn TypeResolver>)>,
    scalars: Vec<(String, Arc<dyn Scalar>)>,
    directives: Vec<(String, Arc<dyn Directive>)>,
    default_resolver: Arc<dyn Resolver>,
}

/// A schema element where directives can be applied
#[derive(Debug, Clone, PartialEq, Eq)]
enum DirectiveSite {
    Type(Name),
    Field(Name, Name),
    Argument(Name, Name, Name),
    InputField(Name, Name),
    EnumValue(Name, Name),
    DirectiveArgument(Name, Name),
}

impl SchemaBuilder {
    pub(crate) fn new(schema: Valid<Schema>) -> Self {
        Self {
            schema,
            resolvers: Vec::new(),
            type_resolvers: Vec::new(),
            scalars: Vec::new(),
            directives: Vec::new(),
            default_resolver: Arc::new(DefaultResolver),
        }
    }

    /// Sets the resolver of the field at `coordinate`, such as `Query.users`
    pub fn resolver(mut self, coordinate: &str, resolver: impl Resolver + 'static) -> Self {
        self.resolvers.push((coordinate.to_owned(), Arc::new(resolver)));
        self
    }

    /// Sets how to find the object type of values resolved for the field at `coordinate`,
    /// whose type must be an interface or union (possibly wrapped in lists).
    ///
    /// Without one, the `__typename` entry of the value is used.
    pub fn type_resolver(
        mut self,
        coordinate: &str,
        type_resolver: impl Fn(&JsonValue, &UserContext, &ResolveInfo<'_>, &str) -> Option<String>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.type_resolvers.push((coordinate.to_owned(), Arc::new(type_resolver)));
        self
    }

    /// Replaces the resolver used for fields without one
    pub fn default_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.default_resolver = Arc::new(resolver);
        self
    }

    /// Implements the scalar type `name`, which may also be a built-in scalar
    pub fn scalar(mut self, name: &str, implementation: impl Scalar + 'static) -> Self {
        self.scalars.push((name.to_owned(), Arc::new(implementation)));
        self
    }

    /// Implements the directive `name`, which must be defined in the schema.
    ///
    /// Applications of directives without an implementation are ignored during execution.
    pub fn directive(mut self, name: &str, implementation: impl Directive + 'static) -> Self {
        self.directives.push((name.to_owned(), Arc::new(implementation)));
        self
    }

    pub fn build(self) -> Result<ExecutableSchema, BuildError> {
        let Self {
            schema,
            resolvers,
            type_resolvers,
            scalars,
            directives,
            default_resolver,
        } = self;
        let resolvers = check_field_coordinates(&schema, resolvers)?;
        let type_resolvers = check_field_coordinates(&schema, type_resolvers)?;
        for coordinate in type_resolvers.keys() {
            let (type_name, field_name) = (&coordinate.0, &coordinate.1);
            let ty = &schema
                .type_field(type_name, field_name)
                .map_err(|_| BuildError::UndefinedField {
                    coordinate: format!("{type_name}.{field_name}"),
                })?
                .ty;
            if !matches!(
                schema.types.get(ty.inner_named_type()),
                Some(ExtendedType::Interface(_) | ExtendedType::Union(_))
            ) {
                return Err(BuildError::NotAbstract {
                    coordinate: format!("{type_name}.{field_name}"),
                    ty: ty.to_string(),
                });
            }
        }
        let mut scalar_implementations = HashMap::new();
        for (name, implementation) in scalars {
            if !matches!(schema.types.get(name.as_str()), Some(ExtendedType::Scalar(_))) {
                return Err(BuildError::UndefinedScalar { name });
            }
            scalar_implementations.insert(name, implementation);
        }
        let mut directive_implementations = HashMap::new();
        for (name, implementation) in directives {
            if !schema.directive_definitions.contains_key(name.as_str()) {
                return Err(BuildError::UndefinedDirective { name });
            }
            directive_implementations.insert(name, implementation);
        }

        // First pass: every named type, referring to others by name
        let mut types = IndexMap::with_capacity(schema.types.len());
        let mut possible_types = HashMap::<&Name, IndexSet<Name>>::new();
        for (name, def) in &schema.types {
            let definition = match def {
                ExtendedType::Scalar(_) => TypeDefinition::Scalar(ScalarDefinition {
                    name: name.clone(),
                    implementation: scalar_implementations
                        .remove(name.as_str())
                        .unwrap_or_else(|| scalar::builtin(name)),
                    directives: Vec::new(),
                }),
                ExtendedType::Enum(def) => TypeDefinition::Enum(EnumDefinition {
                    name: name.clone(),
                    values: def
                        .values
                        .keys()
                        .map(|value| {
                            let def = EnumValueDefinition {
                                name: value.clone(),
                                directives: Vec::new(),
                            };
                            (value.clone(), def)
                        })
                        .collect(),
                    directives: Vec::new(),
                }),
                ExtendedType::InputObject(def) => {
                    TypeDefinition::InputObject(InputObjectDefinition {
                        name: name.clone(),
                        fields: input_values(def.fields.values().map(|field| &field.node)),
                        directives: Vec::new(),
                    })
                }
                ExtendedType::Object(def) => {
                    for interface in &def.implements_interfaces {
                        possible_types
                            .entry(&interface.name)
                            .or_default()
                            .insert(name.clone());
                    }
                    let fields = def
                        .fields
                        .iter()
                        .map(|(field_name, field)| {
                            let coordinate = (name.clone(), field_name.clone());
                            let def = FieldDefinition {
                                name: field_name.clone(),
                                ty: TypeRef::from(&field.ty),
                                arguments: input_values(&field.arguments),
                                directives: Vec::new(),
                                resolver: resolvers
                                    .get(&coordinate)
                                    .cloned()
                                    .unwrap_or_else(|| default_resolver.clone()),
                                type_resolver: type_resolvers.get(&coordinate).cloned(),
                            };
                            (field_name.clone(), def)
                        })
                        .collect();
                    TypeDefinition::Object(ObjectDefinition {
                        name: name.clone(),
                        fields,
                        interfaces: def
                            .implements_interfaces
                            .iter()
                            .map(|interface| interface.name.clone())
                            .collect(),
                        directives: Vec::new(),
                    })
                }
                ExtendedType::Interface(_) => TypeDefinition::Interface(InterfaceDefinition {
                    name: name.clone(),
                    possible_types: IndexSet::new(),
                    directives: Vec::new(),
                }),
                ExtendedType::Union(def) => TypeDefinition::Union(UnionDefinition {
                    name: name.clone(),
                    members: def
                        .members
                        .iter()
                        .map(|member| member.name.clone())
                        .collect(),
                    directives: Vec::new(),
                }),
            };
            types.insert(name.clone(), definition);
        }
        for (interface, objects) in possible_types {
            if let Some(TypeDefinition::Interface(def)) = types.get_mut(interface) {
                def.possible_types = objects
            }
        }
        let directive_definitions = schema
            .directive_definitions
            .iter()
            .map(|(name, def)| {
                let def = DirectiveDefinition {
                    name: name.clone(),
                    arguments: input_values(&def.arguments),
                    implementation: directive_implementations.get(name.as_str()).cloned(),
                };
                (name.clone(), def)
            })
            .collect();

        // Second pass: coerce arguments of directive applications, now that
        // every type they may refer to is known.
        let sites = directive_sites(&schema)
            .into_iter()
            .map(|(site, applications)| (site, applications.into_iter().cloned().collect()))
            .collect::<Vec<(DirectiveSite, Vec<Node<ast::Directive>>)>>();
        let mut executable = ExecutableSchema {
            schema,
            types,
            directive_definitions,
        };
        let mut baked = Vec::new();
        for (site, applications) in &sites {
            let instances = directive_instances(&executable, site, applications)?;
            if !instances.is_empty() {
                baked.push((site, instances))
            }
        }

        // Attach
        let instance_count = baked.iter().map(|(_, instances)| instances.len()).sum::<usize>();
        for (site, instances) in baked {
            if let Some(directives) = executable.site_directives_mut(site) {
                *directives = instances
            }
        }
        tracing::debug!(
            types = executable.types.len(),
            directives = executable.directive_definitions.len(),
            directive_instances = instance_count,
            "built executable schema"
        );
        Ok(executable)
    }
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn keys<T>(entries: &[(String, T)]) -> Vec<&str> {
            entries.iter().map(|(key, _)| key.as_str()).collect()
        }
        f.debug_struct("SchemaBuilder")
            .field("resolvers", &keys(&self.resolvers))
            .field("type_resolvers", &keys(&self.type_resolvers))
            .field("scalars", &keys(&self.scalars))
            .field("directives", &keys(&self.directives))
            .finish_non_exhaustive()
    }
}

/// Checks that every coordinate names a field of an object type
fn check_field_coordinates<T>(
    schema: &Schema,
    registrations: Vec<(String, T)>,
) -> Result<HashMap<(Name, Name), T>, BuildError> {
    registrations
        .into_iter()
        .map(|(coordinate, value)| {
            let Some((type_name, field_name)) = coordinate.split_once('.') else {
                return Err(BuildError::InvalidCoordinate { coordinate });
            };
            let Some((type_name, object)) = schema.types.get_key_value(type_name) else {
                return Err(BuildError::UndefinedField { coordinate });
            };
            let ExtendedType::Object(object) = object else {
                return Err(BuildError::UndefinedField { coordinate });
            };
            let Some((field_name, _)) = object.fields.get_key_value(field_name) else {
                return Err(BuildError::UndefinedField { coordinate });
            };
            Ok(((type_name.clone(), field_name.clone()), value))
        })
        .collect()
}

fn input_values<'a>(
    definitions: impl IntoIterator<Item = &'a Node<schema::InputValueDefinition>>,
) -> IndexMap<Name, InputValueDefinition> {
    definitions
        .into_iter()
        .map(|def| {
            let value = InputValueDefinition {
                name: def.name.clone(),
                ty: TypeRef::from(&*def.ty),
                default_value: def.default_value.clone(),
                directives: Vec::new(),
            };
            (def.name.clone(), value)
        })
        .collect()
}

/// Every schema element with at least one directive application
fn directive_sites(schema: &Schema) -> Vec<(DirectiveSite, Vec<&Node<ast::Directive>>)> {
    let mut sites = Vec::new();
    for (name, def) in &schema.types {
        match def {
            ExtendedType::Scalar(def) => {
                sites.push((DirectiveSite::Type(name.clone()), type_level(&def.directives)))
            }
            ExtendedType::Interface(def) => {
                sites.push((DirectiveSite::Type(name.clone()), type_level(&def.directives)))
            }
            ExtendedType::Union(def) => {
                sites.push((DirectiveSite::Type(name.clone()), type_level(&def.directives)))
            }
            ExtendedType::Enum(def) => {
                sites.push((DirectiveSite::Type(name.clone()), type_level(&def.directives)));
                for (value_name, value) in &def.values {
                    sites.push((
                        DirectiveSite::EnumValue(name.clone(), value_name.clone()),
                        value.directives.iter().collect(),
                    ))
                }
            }
            ExtendedType::InputObject(def) => {
                sites.push((DirectiveSite::Type(name.clone()), type_level(&def.directives)));
                for (field_name, field) in &def.fields {
                    sites.push((
                        DirectiveSite::InputField(name.clone(), field_name.clone()),
                        field.directives.iter().collect(),
                    ))
                }
            }
            ExtendedType::Object(def) => {
                sites.push((DirectiveSite::Type(name.clone()), type_level(&def.directives)));
                for (field_name, field) in &def.fields {
                    sites.push((
                        DirectiveSite::Field(name.clone(), field_name.clone()),
                        field.directives.iter().collect(),
                    ));
                    for argument in &field.arguments {
                        sites.push((
                            DirectiveSite::Argument(
                                name.clone(),
                                field_name.clone(),
                                argument.name.clone(),
                            ),
                            argument.directives.iter().collect(),
                        ))
                    }
                }
            }
        }
    }
    for (name, def) in &schema.directive_definitions {
        for argument in &def.arguments {
            sites.push((
                DirectiveSite::DirectiveArgument(name.clone(), argument.name.clone()),
                argument.directives.iter().collect(),
            ))
        }
    }
    sites.retain(|(_, applications)| !applications.is_empty());
    sites
}

fn type_level(directives: &schema::DirectiveList) -> Vec<&Node<ast::Directive>> {
    directives.iter().map(|directive| &directive.node).collect()
}

/// Coerces the arguments of implemented directives applied to one schema element
fn directive_instances(
    schema: &ExecutableSchema,
    site: &DirectiveSite,
    applications: &[Node<ast::Directive>],
) -> Result<Vec<DirectiveInstance>, BuildError> {
    let cx = CoercionContext {
        schema,
        variables: None,
        context: &(),
    };
    let mut instances = Vec::new();
    for application in applications {
        let Some(definition) = schema.directive_definitions.get(&application.name) else {
            continue;
        };
        let Some(implementation) = &definition.implementation else {
            continue;
        };
        let arguments = futures::executor::block_on(coerce_arguments(
            cx,
            &definition.arguments,
            ArgumentParent::Directive(application),
            &application.arguments,
        ))
        .map_err(|errors| BuildError::DirectiveArguments {
            directive: application.name.to_string(),
            location: site.to_string(),
            message: errors
                .into_iter()
                .map(|error| error.message)
                .collect::<Vec<_>>()
                .join(" "),
        })?;
        instances.push(DirectiveInstance {
            name: application.name.clone(),
            arguments,
            implementation: implementation.clone(),
        })
    }
    Ok(instances)
}

impl ExecutableSchema {
    fn site_directives_mut(&mut self, site: &DirectiveSite) -> Option<&mut Vec<DirectiveInstance>> {
        let directives = match site {
            DirectiveSite::Type(name) => self.types.get_mut(name)?.directives_mut(),
            DirectiveSite::Field(ty, field) => match self.types.get_mut(ty)? {
                TypeDefinition::Object(def) => &mut def.fields.get_mut(field)?.directives,
                _ => return None,
            },
            DirectiveSite::Argument(ty, field, argument) => match self.types.get_mut(ty)? {
                TypeDefinition::Object(def) => {
                    let field = def.fields.get_mut(field)?;
                    &mut field.arguments.get_mut(argument)?.directives
                }
                _ => return None,
            },
            DirectiveSite::InputField(ty, field) => match self.types.get_mut(ty)? {
                TypeDefinition::InputObject(def) => &mut def.fields.get_mut(field)?.directives,
                _ => return None,
            },
            DirectiveSite::EnumValue(ty, value) => match self.types.get_mut(ty)? {
                TypeDefinition::Enum(def) => &mut def.values.get_mut(value)?.directives,
                _ => return None,
            },
            DirectiveSite::DirectiveArgument(directive, argument) => {
                let def = self.directive_definitions.get_mut(directive)?;
                &mut def.arguments.get_mut(argument)?.directives
            }
        };
        Some(directives)
    }
}

/// Renders as a schema coordinate
impl fmt::Display for DirectiveSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectiveSite::Type(ty) => write!(f, "{ty}"),
            DirectiveSite::Field(ty, field)
            | DirectiveSite::InputField(ty, field)
            | DirectiveSite::EnumValue(ty, field) => write!(f, "{ty}.{field}"),
            DirectiveSite::Argument(ty, field, argument) => {
                write!(f, "{ty}.{field}({argument}:)")
            }
            DirectiveSite::DirectiveArgument(directive, argument) => {
                write!(f, "@{directive}({argument}:)")
            }
        }
    }
}
