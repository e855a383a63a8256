use super::spec::ArgumentKind;
use super::state::PopupState;

/// Flatten a popup's switches and options into command-line arguments, in
/// declaration order. Variables never render.
pub fn build_arguments(state: &PopupState) -> Vec<String> {
    let mut args = Vec::new();
    for argument in &state.spec().arguments {
        match argument.kind {
            ArgumentKind::Switch if state.is_enabled(&argument.key) => {
                args.push(argument.cli_flag.clone());
            }
            ArgumentKind::Option { .. } => {
                if let Some(value) = state.option_value(&argument.key) {
                    args.extend(argument.render_option(value));
                }
            }
            _ => {}
        }
    }
    args
}
