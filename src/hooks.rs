use crate::frame::SimulatorHandle;
use crate::simulator::RunView;
use yew::prelude::*;

/// Subscribe the calling component to the simulator's renders.
///
/// Attaches a render sink on mount and detaches it on unmount. Returns the
/// latest view; the component re-renders whenever the simulator does.
#[hook]
pub fn use_run_view(simulator: &SimulatorHandle) -> RunView {
    let view = use_state(|| simulator.view());

    {
        let view_setter = view.setter();
        use_effect_with(simulator.clone(), move |simulator| {
            simulator.update(|sim| {
                sim.attach_sink(Box::new(move |latest: &RunView| {
                    view_setter.set(latest.clone());
                }))
            });
            let simulator = simulator.clone();
            move || simulator.update(|sim| sim.detach_sink())
        });
    }

    (*view).clone()
}
