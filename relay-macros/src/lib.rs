//! relay 框架的过程宏
//!
//! - `#[derive(Observable)]`：为带有 `ChangeNotifier` 字段的具名结构体实现
//!   `::relay_observable::Observable`，`declared_properties` 按声明顺序列出
//!   所有 `Property<_>` 字段；
//! - `can_execute!(root, expr)`：把一个布尔表达式同时编译为可执行谓词与
//!   可检视语法树（`Predicate`）。表达式中对 `root.field` 的直接成员读取
//!   会被改写为 `root.field.get()`；语法树按提取器认可的节点形状降层，
//!   嵌套成员链与未识别节点降为不参与跟踪的形态。
//!
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Data, DeriveInput, Expr, Fields, Ident, Member, Result as SynResult, Token, parse::Parse,
    parse::ParseStream, parse_macro_input,
};

/// 为具名结构体实现 `Observable`。
/// 要求有一个类型为 `ChangeNotifier` 的字段作为通知源；
/// 类型为 `Property<_>` 的字段按声明顺序构成 `declared_properties`。
#[proc_macro_derive(Observable)]
pub fn derive_observable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let fields = match &input.data {
        Data::Struct(st) => match &st.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new(
                    input.ident.span(),
                    "#[derive(Observable)] supports only named-field structs",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                input.ident.span(),
                "#[derive(Observable)] can only be used on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    // 通知源字段：类型路径末段为 ChangeNotifier
    let Some(notifier_field) = fields
        .iter()
        .find(|f| type_last_segment_is(&f.ty, "ChangeNotifier"))
    else {
        return syn::Error::new(
            input.ident.span(),
            "#[derive(Observable)] requires a field of type ChangeNotifier",
        )
        .to_compile_error()
        .into();
    };
    let notifier_ident = notifier_field.ident.as_ref().expect("named field");

    // 属性字段：类型路径末段为 Property，字段名即属性名
    let property_names: Vec<String> = fields
        .iter()
        .filter(|f| type_last_segment_is(&f.ty, "Property"))
        .filter_map(|f| f.ident.as_ref().map(|i| i.to_string()))
        .collect();

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::relay_observable::Observable for #ident #ty_generics #where_clause {
            fn notifier(&self) -> &::relay_observable::ChangeNotifier {
                &self.#notifier_ident
            }

            fn declared_properties(&self) -> &'static [&'static str] {
                &[#(#property_names),*]
            }
        }
    };

    TokenStream::from(expanded)
}

fn type_last_segment_is(ty: &syn::Type, name: &str) -> bool {
    match ty {
        syn::Type::Path(p) => p
            .path
            .segments
            .last()
            .map(|seg| seg.ident == name)
            .unwrap_or(false),
        _ => false,
    }
}

/// `can_execute!(root, expr)`：`root` 必须是一个 `Arc<状态对象>` 绑定。
/// 展开为一个 `Predicate`；谓词闭包克隆 `root` 后按值捕获其余自由变量。
#[proc_macro]
pub fn can_execute(input: TokenStream) -> TokenStream {
    let CanExecuteInput { root, expr } = parse_macro_input!(input as CanExecuteInput);

    let rewritten = rewrite(&root, &expr);
    let lowered = lower(&root, &expr);

    let expanded = quote! {{
        let #root = ::std::sync::Arc::clone(&#root);
        ::relay_command::expr::Predicate::from_parts(
            ::std::sync::Arc::new(move || #rewritten),
            #lowered,
        )
    }};

    TokenStream::from(expanded)
}

struct CanExecuteInput {
    root: Ident,
    expr: Expr,
}

impl Parse for CanExecuteInput {
    fn parse(input: ParseStream) -> SynResult<Self> {
        let root: Ident = input.parse()?;
        let _comma: Token![,] = input.parse()?;
        let expr: Expr = input.parse()?;
        Ok(Self { root, expr })
    }
}

// 表达式基是否恰为被跟踪的根绑定本身（`root.a.b` 的外层基是 `root.a`，不算）
fn is_root(expr: &Expr, root: &Ident) -> bool {
    match expr {
        Expr::Path(p) => p.qself.is_none() && p.path.is_ident(root),
        _ => false,
    }
}

/// 改写谓词主体：`root.field` → `root.field.get()`。
/// 仅在认可的节点形状内递归；其余形状原样保留。
fn rewrite(root: &Ident, expr: &Expr) -> TokenStream2 {
    match expr {
        Expr::Field(field) if is_root(&field.base, root) => {
            let base = &field.base;
            let member = &field.member;
            quote!(#base.#member.get())
        }
        // 外部/嵌套成员访问：只改写其基（`root.a.b` → `root.a.get().b`）
        Expr::Field(field) => {
            let base = rewrite(root, &field.base);
            let member = &field.member;
            quote!(#base.#member)
        }
        Expr::Binary(binary) => {
            let left = rewrite(root, &binary.left);
            let right = rewrite(root, &binary.right);
            let op = &binary.op;
            quote!(#left #op #right)
        }
        Expr::Unary(unary) => {
            let op = &unary.op;
            let operand = rewrite(root, &unary.expr);
            quote!(#op #operand)
        }
        Expr::MethodCall(call) => {
            let receiver = rewrite(root, &call.receiver);
            let method = &call.method;
            let turbofish = call
                .turbofish
                .as_ref()
                .map(|t| quote!(#t))
                .unwrap_or_default();
            let args: Vec<TokenStream2> = call.args.iter().map(|a| rewrite(root, a)).collect();
            quote!(#receiver.#method #turbofish (#(#args),*))
        }
        Expr::Call(call) => {
            let func = rewrite(root, &call.func);
            let args: Vec<TokenStream2> = call.args.iter().map(|a| rewrite(root, a)).collect();
            quote!(#func(#(#args),*))
        }
        Expr::Reference(reference) => {
            let mutability = &reference.mutability;
            let inner = rewrite(root, &reference.expr);
            quote!(& #mutability #inner)
        }
        Expr::Paren(paren) => {
            let inner = rewrite(root, &paren.expr);
            quote!((#inner))
        }
        Expr::Group(group) => rewrite(root, &group.expr),
        other => quote!(#other),
    }
}

/// 按提取器认可的形状把表达式降层为 `PredicateExpr`。
/// 与 `rewrite` 的递归范围保持一致；方法调用不检视接收者。
fn lower(root: &Ident, expr: &Expr) -> TokenStream2 {
    match expr {
        Expr::Field(field) => {
            let name = match &field.member {
                Member::Named(ident) => ident.to_string(),
                // 元组字段不是命名属性
                Member::Unnamed(_) => {
                    return quote!(::relay_command::expr::PredicateExpr::Other);
                }
            };
            let on_root = is_root(&field.base, root);
            quote!(::relay_command::expr::PredicateExpr::Member {
                root: #on_root,
                name: #name,
            })
        }
        Expr::Binary(binary) => {
            let left = lower(root, &binary.left);
            let right = lower(root, &binary.right);
            quote!(::relay_command::expr::PredicateExpr::Binary {
                left: ::std::boxed::Box::new(#left),
                right: ::std::boxed::Box::new(#right),
            })
        }
        Expr::Unary(unary) => {
            let operand = lower(root, &unary.expr);
            quote!(::relay_command::expr::PredicateExpr::Unary {
                operand: ::std::boxed::Box::new(#operand),
            })
        }
        Expr::MethodCall(call) => {
            let args: Vec<TokenStream2> = call.args.iter().map(|a| lower(root, a)).collect();
            quote!(::relay_command::expr::PredicateExpr::Call {
                args: ::std::vec![#(#args),*],
            })
        }
        Expr::Call(call) => {
            let args: Vec<TokenStream2> = call.args.iter().map(|a| lower(root, a)).collect();
            quote!(::relay_command::expr::PredicateExpr::Call {
                args: ::std::vec![#(#args),*],
            })
        }
        Expr::Paren(paren) => lower(root, &paren.expr),
        Expr::Group(group) => lower(root, &group.expr),
        _ => quote!(::relay_command::expr::PredicateExpr::Other),
    }
}
