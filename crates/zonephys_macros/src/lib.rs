use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat, PatType};

/// Ticks between unconditional reports when a system receives the tick counter.
/// One report every ten seconds at 60 Hz.
const REPORT_EVERY_TICKS: u64 = 600;

/// Time a simulation system when the `perf_stats` feature is enabled.
///
/// The function body is wrapped with a drop guard that reports the elapsed
/// time through Bevy's `info!` when it exceeds the threshold. Systems that take
/// a `tick: Res<SimTick>` parameter additionally report every
/// 600 ticks and include the tick number in the line.
///
/// Without `perf_stats` the guard is not emitted at all.
///
/// ```ignore
/// #[profile]
/// pub fn resolve_solids(tick: Res<SimTick>, /* ... */) { /* ... */ }
///
/// #[profile(2)] // report only above 2 ms
/// pub fn update_objects(/* ... */) { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = attr.to_string().trim().parse().unwrap_or(1);

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let system_name = sig.ident.to_string();

    let guard = if sig.inputs.iter().any(is_tick_param) {
        tick_guard(&system_name, threshold_ms)
    } else {
        plain_guard(&system_name, threshold_ms)
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_guard = { #guard };

            #block
        }
    };

    output.into()
}

/// `tick: Res<SimTick>` (any path ending in `SimTick`).
fn is_tick_param(arg: &FnArg) -> bool {
    let FnArg::Typed(PatType { pat, ty, .. }) = arg else {
        return false;
    };
    let Pat::Ident(ident) = pat.as_ref() else {
        return false;
    };
    ident.ident == "tick" && quote!(#ty).to_string().contains("SimTick")
}

fn tick_guard(name: &str, threshold_ms: u128) -> TokenStream2 {
    quote! {
        struct TickProfileGuard {
            name: &'static str,
            start: std::time::Instant,
            tick: u64,
        }
        impl Drop for TickProfileGuard {
            fn drop(&mut self) {
                let elapsed = self.start.elapsed();
                if elapsed.as_millis() > #threshold_ms || self.tick % #REPORT_EVERY_TICKS == 0 {
                    bevy::prelude::info!("[PERF] {} @tick {}: {:?}", self.name, self.tick, elapsed);
                }
            }
        }
        TickProfileGuard {
            name: #name,
            start: std::time::Instant::now(),
            tick: tick.0,
        }
    }
}

fn plain_guard(name: &str, threshold_ms: u128) -> TokenStream2 {
    quote! {
        struct ProfileGuard {
            name: &'static str,
            start: std::time::Instant,
        }
        impl Drop for ProfileGuard {
            fn drop(&mut self) {
                let elapsed = self.start.elapsed();
                if elapsed.as_millis() > #threshold_ms {
                    bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                }
            }
        }
        ProfileGuard {
            name: #name,
            start: std::time::Instant::now(),
        }
    }
}
