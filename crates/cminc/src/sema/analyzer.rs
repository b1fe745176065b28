//! Semantic analyzer - symbol table construction followed by type checking

use log::{debug, info};

use super::annotations::Annotations;
use super::builder::{BuildOutput, SymbolTableBuilder};
use super::checker::TypeChecker;
use super::diagnostic::Diagnostics;
use super::scope::{ScopeId, ScopeStore, Symbol};
use super::types::ExpType;
use crate::ast::{Ast, NodeId};

/// Configuration options for the analyzer
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Log the symbol table listing after it is built
    pub trace_symtab: bool,
    /// Pre-declare the `input`/`output` runtime functions
    pub builtins: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            trace_symtab: false,
            builtins: true,
        }
    }
}

/// Result of analysing one translation unit
#[derive(Debug)]
pub struct Analysis {
    pub symbols: ScopeStore,
    pub annotations: Annotations,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    /// Whether any diagnostic was reported; code generation must not run
    pub fn failed(&self) -> bool {
        self.diagnostics.failed()
    }

    pub fn type_of(&self, node: NodeId) -> Option<ExpType> {
        self.annotations.type_of(node)
    }

    /// Global function symbol, with its return type and parameter signature
    pub fn function(&self, name: &str) -> Option<&Symbol> {
        let global = self.symbols.global()?;
        self.symbols
            .lookup_local(global, name)
            .map(|id| self.symbols.symbol(id))
            .filter(|symbol| symbol.is_function)
    }

    /// Symbol visible as `name` from the scope owned by `block`
    pub fn resolve_in_block(&self, block: NodeId, name: &str) -> Option<&Symbol> {
        let scope: ScopeId = self.annotations.block_scope(block)?;
        self.symbols.lookup(scope, name).map(|id| self.symbols.symbol(id))
    }
}

/// Semantic analyzer driving both passes
#[derive(Debug, Clone, Default)]
pub struct SemanticAnalyzer {
    config: AnalyzerConfig,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Builder pass only, into a fresh store
    pub fn build_symtab(&self, ast: &Ast) -> BuildOutput {
        let output = SymbolTableBuilder::new(self.config.builtins).build(ast);
        if self.config.trace_symtab {
            info!("\nSymbol table:\n\n{}", output.store.dump());
        }
        output
    }

    /// Analyze a translation unit
    pub fn analyze(&self, ast: &Ast) -> Analysis {
        let BuildOutput {
            store,
            mut annotations,
            mut diagnostics,
        } = self.build_symtab(ast);

        TypeChecker::check(ast, &store, &mut annotations, &mut diagnostics);
        debug!(
            "analysis finished: {} diagnostics, {} typed nodes",
            diagnostics.len(),
            annotations.typed_nodes()
        );

        Analysis {
            symbols: store,
            annotations,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, BinaryOp, NodeKind, TypeSpec};
    use crate::sema::DiagnosticKind;
    use pretty_assertions::assert_eq;

    fn analyze(ast: &Ast) -> Analysis {
        SemanticAnalyzer::new().analyze(ast)
    }

    fn records(analysis: &Analysis) -> Vec<String> {
        analysis.diagnostics.iter().map(ToString::to_string).collect()
    }

    fn void_function(b: &mut AstBuilder, name: &str, locals: &[NodeId], stmts: &[NodeId], line: u32) -> NodeId {
        let void = b.void_params(line);
        let body = b.compound(locals, stmts, line);
        b.function(name, Some(TypeSpec::Void), Some(void), Some(body), line)
    }

    /// gcd program with arrays, loops and nested blocks
    fn gcd_program() -> (Ast, [NodeId; 4]) {
        let mut b = AstBuilder::new();
        let vals = b.array_var("vals", Some(TypeSpec::Int), Some(10), 1);

        // int gcd(int u, int v)
        let u = b.int_param("u", 2);
        let v = b.int_param("v", 2);
        let params = b.list(&[u, v]);
        let v_ref = b.id("v", 3);
        let zero = b.constant(0, 3);
        let test = b.binary(BinaryOp::Eq, v_ref, zero, 3);
        let u_ret = b.id("u", 3);
        let ret_u = b.return_stmt(Some(u_ret), 3);
        let v_arg = b.id("v", 4);
        let u1 = b.id("u", 4);
        let u2 = b.id("u", 4);
        let v2 = b.id("v", 4);
        let div = b.binary(BinaryOp::Div, u2, v2, 4);
        let v3 = b.id("v", 4);
        let mul = b.binary(BinaryOp::Mul, div, v3, 4);
        let rem = b.binary(BinaryOp::Sub, u1, mul, 4);
        let rec = b.call("gcd", &[v_arg, rem], 4);
        let ret_rec = b.return_stmt(Some(rec), 4);
        let branch = b.if_stmt(Some(test), Some(ret_u), Some(ret_rec), 3);
        let gcd_body = b.compound(&[], &[branch], 2);
        let gcd = b.function("gcd", Some(TypeSpec::Int), params, Some(gcd_body), 2);

        // void main(void)
        let x = b.int_var("x", 7);
        let y = b.int_var("y", 7);
        let tx = b.id("x", 8);
        let in1 = b.call("input", &[], 8);
        let s1 = b.assign_stmt(tx, in1, 8);
        let ty = b.id("y", 8);
        let in2 = b.call("input", &[], 8);
        let s2 = b.assign(ty, in2, 8);
        let idx = b.constant(0, 9);
        let slot = b.array_id("vals", Some(idx), 9);
        let xv = b.id("x", 9);
        let s3 = b.assign(slot, xv, 9);

        let lx = b.id("x", 10);
        let ly = b.id("y", 10);
        let cond = b.binary(BinaryOp::Lt, lx, ly, 10);
        let t = b.int_var("t", 11);
        let tt = b.id("t", 12);
        let tx2 = b.id("x", 12);
        let swap1 = b.assign_stmt(tt, tx2, 12);
        let tx3 = b.id("x", 13);
        let ty3 = b.id("y", 13);
        let swap2 = b.assign_stmt(tx3, ty3, 13);
        let ty4 = b.id("y", 14);
        let tt4 = b.id("t", 14);
        let swap3 = b.assign_stmt(ty4, tt4, 14);
        let loop_body = b.compound(&[t], &[swap1, swap2, swap3], 11);
        let swap_loop = b.while_stmt(Some(cond), Some(loop_body), 10);

        let gx = b.id("x", 15);
        let gy = b.id("y", 15);
        let call_gcd = b.call("gcd", &[gx, gy], 15);
        let print = b.call("output", &[call_gcd], 15);
        let main = void_function(&mut b, "main", &[x, y], &[s1, s2, s3, swap_loop, print], 6);

        (b.finish(&[vals, gcd, main]), [gcd_body, loop_body, print, rec])
    }

    #[test]
    fn test_valid_program_has_no_diagnostics_and_full_types() {
        let (ast, [gcd_body, loop_body, print, rec]) = gcd_program();
        let analysis = analyze(&ast);

        assert!(!analysis.failed(), "{:?}", records(&analysis));
        for id in ast.ids() {
            if matches!(ast.node(id).kind, NodeKind::Expr(_) | NodeKind::Decl(_)) {
                assert!(analysis.type_of(id).is_some(), "untyped node {id}");
            }
        }

        assert_eq!(analysis.type_of(print), Some(ExpType::Void));
        assert_eq!(analysis.type_of(rec), Some(ExpType::Integer));

        let gcd = analysis.function("gcd").unwrap();
        assert_eq!(gcd.parameter_types, vec![ExpType::Integer, ExpType::Integer]);
        assert_eq!(gcd.reference_lines, vec![2, 4, 15]);

        let t = analysis.resolve_in_block(loop_body, "t").unwrap();
        assert_eq!(t.reference_lines, vec![11, 12, 14]);
        assert!(analysis.resolve_in_block(gcd_body, "t").is_none());
        assert!(analysis.resolve_in_block(gcd_body, "vals").is_some());
    }

    #[test]
    fn test_symbol_table_listing() {
        let (ast, _) = gcd_program();
        let analysis = analyze(&ast);

        let expected = "\
Variable Name  Variable Type  Scope Name  Location   Line Numbers
-------------  -------------  ----------  --------   ------------
vals           IntegerArray   global      2          1 9
main           Function       global      4          6
input          Function       global      1          0 8 8
output         Function       global      0          0 15
gcd            Function       global      3          2 4 15
u              Integer        gcd         0          2 3 4 4
v              Integer        gcd         1          2 3 4 4 4
x              Integer        main        0          7 8 9 10 12 13 15
y              Integer        main        1          7 8 10 13 14 15
t              Integer        0           0          11 12 14
";
        assert_eq!(analysis.symbols.dump(), expected);
    }

    #[test]
    fn test_shadowing_is_not_redeclaration() {
        let mut b = AstBuilder::new();
        let outer = b.int_var("x", 1);
        let inner = b.int_var("x", 3);
        let target = b.id("x", 4);
        let one = b.constant(1, 4);
        let assign = b.assign_stmt(target, one, 4);
        let void = b.void_params(2);
        let body = b.compound(&[inner], &[assign], 2);
        let main = b.function("main", Some(TypeSpec::Void), Some(void), Some(body), 2);
        let ast = b.finish(&[outer, main]);

        let analysis = analyze(&ast);
        assert!(analysis.diagnostics.is_empty());

        let global = analysis.symbols.global().unwrap();
        let outer = analysis.symbols.symbol(analysis.symbols.lookup(global, "x").unwrap());
        let inner = analysis.resolve_in_block(body, "x").unwrap();
        assert_ne!(outer.memory_location, inner.memory_location);
        assert_eq!(outer.reference_lines, vec![1]);
        assert_eq!(inner.reference_lines, vec![3, 4]);
    }

    #[test]
    fn test_redeclaration_keeps_first_declaration() {
        let mut b = AstBuilder::new();
        let first = b.int_var("x", 3);
        let second = b.array_var("x", Some(TypeSpec::Int), Some(4), 4);
        let main = void_function(&mut b, "main", &[first, second], &[], 2);
        let ast = b.finish(&[main]);

        let analysis = analyze(&ast);
        assert_eq!(
            records(&analysis),
            vec!["Scope error at line(4), name=x : array redeclared"]
        );

        let scope = analysis.symbols.find_scope_by_name("main").unwrap();
        let x = analysis.symbols.symbol(analysis.symbols.lookup_local(scope, "x").unwrap());
        assert_eq!(x.ty, ExpType::Integer);
        assert_eq!(x.memory_location, 0);
        assert_eq!(x.reference_lines, vec![3]);
        assert_eq!(analysis.symbols.scope(scope).location(), 1);
    }

    #[test]
    fn test_undeclared_use_is_reported_once() {
        let mut b = AstBuilder::new();
        let target = b.id("y", 12);
        let one = b.constant(1, 12);
        let assign = b.assign_stmt(target, one, 12);
        let main = void_function(&mut b, "main", &[], &[assign], 10);
        let ast = b.finish(&[main]);

        let analysis = analyze(&ast);
        assert_eq!(
            records(&analysis),
            vec!["Scope error at line(12), name=y : identifier is not declared"]
        );
        assert!(analysis.symbols.symbols().all(|(_, symbol)| symbol.name != "y"));
        assert!(analysis.failed());
    }

    #[test]
    fn test_nested_function_is_rejected() {
        let mut b = AstBuilder::new();
        let nested = void_function(&mut b, "g", &[], &[], 3);
        let main = void_function(&mut b, "main", &[nested], &[], 2);
        let call = b.call("g", &[], 6);
        let caller = void_function(&mut b, "h", &[], &[call], 5);
        let ast = b.finish(&[main, caller]);

        let analysis = analyze(&ast);
        assert_eq!(
            analysis
                .diagnostics
                .count(|k| *k == DiagnosticKind::FunctionNotGlobal),
            1
        );
        assert!(analysis.function("g").is_none());
        assert_eq!(
            records(&analysis),
            vec![
                "Scope error at line(3), name=g : functions may only be declared at global scope",
                "Scope error at line(6), name=g : identifier is not declared",
            ]
        );
    }

    #[test]
    fn test_function_redeclared() {
        let mut b = AstBuilder::new();
        let first = void_function(&mut b, "f", &[], &[], 1);
        let ghost = b.id("ghost", 4);
        let value = b.return_stmt(Some(ghost), 4);
        let second = void_function(&mut b, "f", &[], &[value], 3);
        let ast = b.finish(&[first, second]);

        let analysis = analyze(&ast);
        assert_eq!(
            records(&analysis),
            vec![
                "Scope error at line(3), name=f : function redeclared",
                "Scope error at line(4), name=ghost : identifier is not declared",
                "Type error at line(4), name=f : function should return nothing",
            ]
        );
        assert_eq!(analysis.function("f").unwrap().reference_lines, vec![1]);
    }

    #[test]
    fn test_call_arity_and_argument_types() {
        let mut b = AstBuilder::new();
        let pa = b.int_param("a", 1);
        let pb = b.int_param("b", 1);
        let params = b.list(&[pa, pb]);
        let f_body = b.compound(&[], &[], 1);
        let f = b.function("f", Some(TypeSpec::Void), params, Some(f_body), 1);

        let arr = b.array_var("arr", Some(TypeSpec::Int), Some(3), 3);
        let one = b.constant(1, 4);
        let short = b.call("f", &[one], 4);
        let one = b.constant(1, 5);
        let whole = b.id("arr", 5);
        let wrong = b.call("f", &[one, whole], 5);
        let one = b.constant(1, 6);
        let two = b.constant(2, 6);
        let good = b.call("f", &[one, two], 6);
        let one = b.constant(1, 7);
        let two = b.constant(2, 7);
        let three = b.constant(3, 7);
        let long = b.call("f", &[one, two, three], 7);
        let main = void_function(&mut b, "main", &[arr], &[short, wrong, good, long], 2);
        let ast = b.finish(&[f, main]);

        let analysis = analyze(&ast);
        assert_eq!(
            records(&analysis),
            vec![
                "Type error at line(4), name=f : argument count mismatch: expected 2, found 1",
                "Type error at line(5), name=f : argument type mismatch at position 2: expected Integer, found IntegerArray",
                "Type error at line(7), name=f : argument count mismatch: expected 2, found 3",
            ]
        );
        assert_eq!(analysis.type_of(good), Some(ExpType::Void));
    }

    #[test]
    fn test_array_parameter_accepts_whole_array() {
        let mut b = AstBuilder::new();
        let pa = b.array_param("a", 1);
        let pn = b.int_param("n", 1);
        let params = b.list(&[pa, pn]);
        let idx = b.id("n", 2);
        let elem = b.array_id("a", Some(idx), 2);
        let ret = b.return_stmt(Some(elem), 2);
        let body = b.compound(&[], &[ret], 1);
        let last = b.function("last", Some(TypeSpec::Int), params, Some(body), 1);

        let arr = b.array_var("arr", Some(TypeSpec::Int), Some(3), 4);
        let whole = b.id("arr", 5);
        let n = b.constant(2, 5);
        let call = b.call("last", &[whole, n], 5);
        let print = b.call("output", &[call], 5);
        let main = void_function(&mut b, "main", &[arr], &[print], 3);
        let ast = b.finish(&[last, main]);

        let analysis = analyze(&ast);
        assert!(analysis.diagnostics.is_empty(), "{:?}", records(&analysis));
        assert_eq!(analysis.type_of(call), Some(ExpType::Integer));
    }

    #[test]
    fn test_return_matching() {
        let mut b = AstBuilder::new();
        let bare = b.return_stmt(None, 2);
        let body = b.compound(&[], &[bare], 1);
        let void = b.void_params(1);
        let f1 = b.function("f1", Some(TypeSpec::Int), Some(void), Some(body), 1);

        let five = b.constant(5, 4);
        let valued = b.return_stmt(Some(five), 4);
        let f2 = void_function(&mut b, "f2", &[], &[valued], 3);

        let five = b.constant(5, 6);
        let good = b.return_stmt(Some(five), 6);
        let body = b.compound(&[], &[good], 5);
        let void = b.void_params(5);
        let f3 = b.function("f3", Some(TypeSpec::Int), Some(void), Some(body), 5);

        let arr = b.array_var("arr", Some(TypeSpec::Int), Some(2), 8);
        let whole = b.id("arr", 9);
        let array_ret = b.return_stmt(Some(whole), 9);
        let body = b.compound(&[arr], &[array_ret], 7);
        let void = b.void_params(7);
        let f4 = b.function("f4", Some(TypeSpec::Int), Some(void), Some(body), 7);

        let ast = b.finish(&[f1, f2, f3, f4]);

        let analysis = analyze(&ast);
        assert_eq!(
            records(&analysis),
            vec![
                "Type error at line(2), name=f1 : function should return something",
                "Type error at line(4), name=f2 : function should return nothing",
                "Type error at line(9), name=f4 : return type mismatch: expected Integer, found IntegerArray",
            ]
        );
    }

    #[test]
    fn test_analysis_runs_are_independent() {
        let (ast, _) = gcd_program();
        let analyzer = SemanticAnalyzer::with_config(AnalyzerConfig {
            trace_symtab: true,
            ..AnalyzerConfig::default()
        });

        let first = analyzer.analyze(&ast);
        let second = analyzer.analyze(&ast);
        assert!(!second.failed());
        assert_eq!(first.symbols.dump(), second.symbols.dump());
        assert_eq!(
            first.function("gcd").unwrap().reference_lines,
            second.function("gcd").unwrap().reference_lines
        );
    }

    #[test]
    fn test_without_builtins_io_calls_are_undeclared() {
        let mut b = AstBuilder::new();
        let read = b.call("input", &[], 2);
        let print = b.call("output", &[read], 2);
        let main = void_function(&mut b, "main", &[], &[print], 1);
        let ast = b.finish(&[main]);

        let analyzer = SemanticAnalyzer::with_config(AnalyzerConfig {
            builtins: false,
            ..AnalyzerConfig::default()
        });
        let analysis = analyzer.analyze(&ast);
        assert_eq!(analysis.diagnostics.count(|k| *k == DiagnosticKind::Undeclared), 2);
        assert!(!analysis.diagnostics.has_internal_errors());
    }

    #[test]
    fn test_diagnostic_stream() {
        let mut b = AstBuilder::new();
        let v = b.var("v", Some(TypeSpec::Void), 1);
        let arg = b.constant(0, 3);
        let void_call = b.call("output", &[arg], 3);
        let then = b.compound(&[], &[], 3);
        let branch = b.if_stmt(Some(void_call), Some(then), None, 3);
        let main = void_function(&mut b, "main", &[], &[branch], 2);
        let ast = b.finish(&[v, main]);

        let analysis = analyze(&ast);
        let mut out = Vec::new();
        analysis.diagnostics.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Type error at line(1), name=v : variable cannot be declared void\n\
             Type error at line 3: if test is void\n"
        );
    }
}
