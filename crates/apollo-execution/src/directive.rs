use crate::error::FieldError;
use crate::resolver::ResolveInfo;
use crate::resolver::Resolver;
use crate::resolver::UserContext;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::ast;
use apollo_compiler::executable;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::Name;
use apollo_compiler::Node;
use futures::future::BoxFuture;
use futures::FutureExt as _;
use std::sync::Arc;

/// Implementation of a directive defined in the schema.
///
/// Each hook receives the coerced arguments of the directive application
/// and a continuation. Directives applied to the same element form a chain
/// in declaration order: the first one is outermost, and calling `next`
/// runs the rest of the chain. Not calling `next` short-circuits it.
///
/// Every hook defaults to passing its value through unchanged.
pub trait Directive: Send + Sync {
    /// Called after the value of an argument definition carrying this directive was coerced,
    /// for a field or directive application in the executable document.
    fn on_argument_execution<'a>(
        &'a self,
        directive_arguments: &'a JsonMap,
        next: Next<'a>,
        parent: ArgumentParent<'a>,
        argument: Option<&'a Node<ast::Argument>>,
        value: JsonValue,
        context: &'a UserContext,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        let _ = (directive_arguments, parent, argument, context);
        next.run(value)
    }

    /// Called after input coercion of a value of a scalar, enum, or input object type
    /// carrying this directive, and for input fields and enum values carrying it.
    fn on_post_input_coercion<'a>(
        &'a self,
        directive_arguments: &'a JsonMap,
        next: Next<'a>,
        value: JsonValue,
        context: &'a UserContext,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        let _ = (directive_arguments, context);
        next.run(value)
    }

    /// Called with the value returned by a resolver, before it is completed,
    /// when the type of the field (or an enum value) carries this directive.
    fn on_pre_output_coercion<'a>(
        &'a self,
        directive_arguments: &'a JsonMap,
        next: Next<'a>,
        value: JsonValue,
        context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        let _ = (directive_arguments, context, info);
        next.run(value)
    }

    /// Wraps the resolver of a field definition carrying this directive,
    /// or of a field selection carrying it in the executable document.
    #[allow(clippy::too_many_arguments)]
    fn on_field_execution<'a>(
        &'a self,
        directive_arguments: &'a JsonMap,
        next: NextResolver<'a>,
        source: &'a JsonValue,
        field_arguments: JsonMap,
        context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        let _ = (directive_arguments, context, info);
        next.run(source, field_arguments)
    }
}

/// The node holding the arguments passed to [`Directive::on_argument_execution`]
#[derive(Debug, Clone, Copy)]
pub enum ArgumentParent<'a> {
    Field(&'a Node<executable::Field>),
    Directive(&'a Node<ast::Directive>),
}

impl ArgumentParent<'_> {
    pub fn location(&self) -> Option<SourceSpan> {
        match self {
            ArgumentParent::Field(field) => field.location(),
            ArgumentParent::Directive(directive) => directive.location(),
        }
    }
}

/// A directive applied to a schema element or to a field selection,
/// with its arguments already coerced.
#[derive(Clone)]
pub(crate) struct DirectiveInstance {
    pub(crate) name: Name,
    pub(crate) arguments: JsonMap,
    pub(crate) implementation: Arc<dyn Directive>,
}

/// Rest of a chain of value hooks
pub struct Next<'a> {
    chain: &'a [DirectiveInstance],
    hook: Hook<'a>,
    context: &'a UserContext,
}

#[derive(Clone, Copy)]
enum Hook<'a> {
    ArgumentExecution {
        parent: ArgumentParent<'a>,
        argument: Option<&'a Node<ast::Argument>>,
    },
    PostInputCoercion,
    PreOutputCoercion {
        info: &'a ResolveInfo<'a>,
    },
}

impl<'a> Next<'a> {
    pub(crate) fn argument_execution(
        chain: &'a [DirectiveInstance],
        parent: ArgumentParent<'a>,
        argument: Option<&'a Node<ast::Argument>>,
        context: &'a UserContext,
    ) -> Self {
        Self {
            chain,
            hook: Hook::ArgumentExecution { parent, argument },
            context,
        }
    }

    pub(crate) fn post_input_coercion(
        chain: &'a [DirectiveInstance],
        context: &'a UserContext,
    ) -> Self {
        Self {
            chain,
            hook: Hook::PostInputCoercion,
            context,
        }
    }

    pub(crate) fn pre_output_coercion(
        chain: &'a [DirectiveInstance],
        context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> Self {
        Self {
            chain,
            hook: Hook::PreOutputCoercion { info },
            context,
        }
    }

    /// Runs the rest of the chain, returning the value unchanged at its end
    pub fn run(self, value: JsonValue) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        let Some((directive, rest)) = self.chain.split_first() else {
            return futures::future::ready(Ok(value)).boxed();
        };
        tracing::trace!(directive = %directive.name, "value hook");
        let implementation = &*directive.implementation;
        let arguments = &directive.arguments;
        let context = self.context;
        let next = Next {
            chain: rest,
            ..self
        };
        match self.hook {
            Hook::ArgumentExecution { parent, argument } => implementation
                .on_argument_execution(arguments, next, parent, argument, value, context),
            Hook::PostInputCoercion => {
                implementation.on_post_input_coercion(arguments, next, value, context)
            }
            Hook::PreOutputCoercion { info } => {
                implementation.on_pre_output_coercion(arguments, next, value, context, info)
            }
        }
    }
}

/// Rest of a chain of [`Directive::on_field_execution`] hooks, ending with the field resolver
#[derive(Clone, Copy)]
pub struct NextResolver<'a> {
    chain: &'a [DirectiveInstance],
    resolver: &'a dyn Resolver,
    context: &'a UserContext,
    info: &'a ResolveInfo<'a>,
}

impl<'a> NextResolver<'a> {
    pub(crate) fn new(
        chain: &'a [DirectiveInstance],
        resolver: &'a dyn Resolver,
        context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> Self {
        Self {
            chain,
            resolver,
            context,
            info,
        }
    }

    /// Runs the rest of the chain, calling the resolver at its end
    pub fn run(
        self,
        source: &'a JsonValue,
        arguments: JsonMap,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        match self.chain.split_first() {
            Some((directive, rest)) => {
                tracing::trace!(directive = %directive.name, "field execution hook");
                let next = NextResolver {
                    chain: rest,
                    ..self
                };
                directive.implementation.on_field_execution(
                    &directive.arguments,
                    next,
                    source,
                    arguments,
                    self.context,
                    self.info,
                )
            }
            None => async move {
                self.resolver
                    .resolve(source, &arguments, self.context, self.info)
                    .await
            }
            .boxed(),
        }
    }
}
